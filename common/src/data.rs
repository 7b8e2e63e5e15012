//! Plutus `Data`: the untyped tree every script argument is encoded in.

use std::fmt;

use dashu_int::IBig;
use serde_with::{hex::Hex, serde_as, DisplayFromStr};

/// Recursive Data tree
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PlutusData {
    Constr(#[serde_as(as = "DisplayFromStr")] IBig, Vec<PlutusData>),
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(#[serde_as(as = "DisplayFromStr")] IBig),
    ByteString(#[serde_as(as = "Hex")] Vec<u8>),
}

impl PlutusData {
    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr(IBig::from(tag), fields)
    }

    pub fn integer(value: impl Into<IBig>) -> Self {
        Self::Integer(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::ByteString(value.into())
    }

    /// Index of the constructor in `Constr, Map, List, I, B` order
    pub fn constructor_index(&self) -> usize {
        match self {
            Self::Constr(..) => 0,
            Self::Map(_) => 1,
            Self::List(_) => 2,
            Self::Integer(_) => 3,
            Self::ByteString(_) => 4,
        }
    }
}

impl fmt::Display for PlutusData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constr(tag, fields) => {
                write!(f, "Constr {tag} [")?;
                write_separated(f, fields)?;
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "Map [")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "({k}, {v})")?;
                }
                write!(f, "]")
            }
            Self::List(items) => {
                write!(f, "List [")?;
                write_separated(f, items)?;
                write!(f, "]")
            }
            Self::Integer(i) => write!(f, "I {i}"),
            Self::ByteString(b) => write!(f, "B #{}", hex::encode(b)),
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, items: &[PlutusData]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_nested_data() {
        let data = PlutusData::constr(
            1,
            vec![
                PlutusData::integer(-5),
                PlutusData::Map(vec![(PlutusData::bytes(vec![0xab]), PlutusData::List(vec![]))]),
            ],
        );
        assert_eq!(data.to_string(), "Constr 1 [I -5, Map [(B #ab, List [])]]");
    }

    #[test]
    fn json_encoding_keeps_big_integers_exact() -> Result<(), anyhow::Error> {
        let data = PlutusData::Constr(
            IBig::from(0u8),
            vec![
                PlutusData::Integer("123456789012345678901234567890".parse()?),
                PlutusData::bytes(vec![0xde, 0xad]),
            ],
        );
        let json = serde_json::to_string(&data)?;
        assert_eq!(
            json,
            r#"{"Constr":["0",[{"Integer":"123456789012345678901234567890"},{"ByteString":"dead"}]]}"#
        );
        assert_eq!(serde_json::from_str::<PlutusData>(&json)?, data);
        Ok(())
    }

    #[test]
    fn constructor_indices_follow_declaration_order() {
        let all = [
            PlutusData::constr(0, vec![]),
            PlutusData::Map(vec![]),
            PlutusData::List(vec![]),
            PlutusData::integer(0),
            PlutusData::bytes(vec![]),
        ];
        for (i, d) in all.iter().enumerate() {
            assert_eq!(d.constructor_index(), i);
        }
    }
}
