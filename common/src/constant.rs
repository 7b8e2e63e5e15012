//! Typed constants and their types.

use std::fmt;

use dashu_int::IBig;
use serde_with::{hex::Hex, serde_as, DisplayFromStr};

use crate::bls::{G1Element, G2Element, MlResult};
use crate::builtin_value::BuiltinValue;
use crate::data::PlutusData;

/// Constant type
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Type {
    Integer,
    ByteString,
    String,
    Unit,
    Bool,
    Data,
    List(Box<Type>),
    Pair(Box<Type>, Box<Type>),
    Bls12_381G1Element,
    Bls12_381G2Element,
    Bls12_381MlResult,
    Value,
}

impl Type {
    pub fn list(element: Type) -> Self {
        Self::List(Box::new(element))
    }

    pub fn pair(first: Type, second: Type) -> Self {
        Self::Pair(Box::new(first), Box::new(second))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => f.write_str("integer"),
            Type::ByteString => f.write_str("bytestring"),
            Type::String => f.write_str("string"),
            Type::Unit => f.write_str("unit"),
            Type::Bool => f.write_str("bool"),
            Type::Data => f.write_str("data"),
            Type::List(t) => write!(f, "(list {t})"),
            Type::Pair(a, b) => write!(f, "(pair {a} {b})"),
            Type::Bls12_381G1Element => f.write_str("bls12_381_G1_element"),
            Type::Bls12_381G2Element => f.write_str("bls12_381_G2_element"),
            Type::Bls12_381MlResult => f.write_str("bls12_381_mlresult"),
            Type::Value => f.write_str("value"),
        }
    }
}

/// A constant with its value
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Constant {
    Integer(#[serde_as(as = "DisplayFromStr")] IBig),
    ByteString(#[serde_as(as = "Hex")] Vec<u8>),
    String(String),
    Unit,
    Bool(bool),
    Data(PlutusData),
    /// Homogeneous list, carrying its element type so empty lists stay typed
    ProtoList(Type, Vec<Constant>),
    ProtoPair(Type, Type, Box<Constant>, Box<Constant>),
    Bls12_381G1Element(G1Element),
    Bls12_381G2Element(G2Element),
    Bls12_381MlResult(MlResult),
    Value(BuiltinValue),
}

impl Constant {
    pub fn integer(value: impl Into<IBig>) -> Self {
        Self::Integer(value.into())
    }

    pub fn byte_string(value: impl Into<Vec<u8>>) -> Self {
        Self::ByteString(value.into())
    }

    pub fn list(element: Type, items: Vec<Constant>) -> Self {
        Self::ProtoList(element, items)
    }

    pub fn pair(first: Constant, second: Constant) -> Self {
        Self::ProtoPair(
            first.type_of(),
            second.type_of(),
            Box::new(first),
            Box::new(second),
        )
    }

    /// List of Data
    pub fn data_list(items: Vec<PlutusData>) -> Self {
        Self::ProtoList(Type::Data, items.into_iter().map(Constant::Data).collect())
    }

    pub fn type_of(&self) -> Type {
        match self {
            Constant::Integer(_) => Type::Integer,
            Constant::ByteString(_) => Type::ByteString,
            Constant::String(_) => Type::String,
            Constant::Unit => Type::Unit,
            Constant::Bool(_) => Type::Bool,
            Constant::Data(_) => Type::Data,
            Constant::ProtoList(t, _) => Type::list(t.clone()),
            Constant::ProtoPair(a, b, _, _) => Type::pair(a.clone(), b.clone()),
            Constant::Bls12_381G1Element(_) => Type::Bls12_381G1Element,
            Constant::Bls12_381G2Element(_) => Type::Bls12_381G2Element,
            Constant::Bls12_381MlResult(_) => Type::Bls12_381MlResult,
            Constant::Value(_) => Type::Value,
        }
    }

    /// Render the value part only, as it appears inside lists and pairs
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer(i) => write!(f, "{i}"),
            Constant::ByteString(b) => write!(f, "#{}", hex::encode(b)),
            Constant::String(s) => write!(f, "{s:?}"),
            Constant::Unit => f.write_str("()"),
            Constant::Bool(true) => f.write_str("True"),
            Constant::Bool(false) => f.write_str("False"),
            Constant::Data(d) => write!(f, "({d})"),
            Constant::ProtoList(_, items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_value(f)?;
                }
                f.write_str("]")
            }
            Constant::ProtoPair(_, _, a, b) => {
                f.write_str("(")?;
                a.fmt_value(f)?;
                f.write_str(", ")?;
                b.fmt_value(f)?;
                f.write_str(")")
            }
            Constant::Bls12_381G1Element(e) => write!(f, "0x{}", hex::encode(e.as_bytes())),
            Constant::Bls12_381G2Element(e) => write!(f, "0x{}", hex::encode(e.as_bytes())),
            Constant::Bls12_381MlResult(e) => write!(f, "0x{}", hex::encode(e.as_bytes())),
            Constant::Value(v) => {
                f.write_str("[")?;
                for (i, (currency, token, quantity)) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "(#{}, #{}, {quantity})", hex::encode(currency), hex::encode(token))?;
                }
                f.write_str("]")
            }
        }
    }
}

/// `<type> <value>`, the body of a `(con ...)` term
impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.type_of())?;
        self.fmt_value(f)
    }
}
