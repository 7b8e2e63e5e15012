//! Abstract memory sizes of constants, the inputs to builtin cost functions.

use dashu_int::ops::{BitTest, UnsignedAbs};
use dashu_int::IBig;

use crate::builtin_value::BuiltinValue;
use crate::constant::Constant;
use crate::costing_integer::CostingInteger;
use crate::data::PlutusData;

/// Memory charged per Data node on top of its content
const DATA_NODE_USAGE: i64 = 4;

/// Size of a value as seen by the cost model
pub trait MemoryUsage {
    fn memory_usage(&self) -> CostingInteger;
}

/// 64-bit words needed for the magnitude; zero occupies one word
pub fn integer_usage(i: &IBig) -> CostingInteger {
    let bits = i.bit_len();
    if bits == 0 {
        CostingInteger::ONE
    } else {
        CostingInteger::from((bits - 1) / 64 + 1)
    }
}

/// 8-byte words; the empty string occupies one word
pub fn byte_string_usage(len: usize) -> CostingInteger {
    if len == 0 {
        CostingInteger::ONE
    } else {
        CostingInteger::from((len - 1) / 8 + 1)
    }
}

/// The integer itself, as an absolute value, saturating
pub fn literal_usage(i: &IBig) -> CostingInteger {
    i64::try_from(i.unsigned_abs())
        .map(CostingInteger::new)
        .unwrap_or(CostingInteger::MAX)
}

/// A byte count converted to 8-byte words, with zero staying zero.
/// Negative counts size as zero.
pub fn byte_count_as_words(i: &IBig) -> CostingInteger {
    if *i <= IBig::ZERO {
        return CostingInteger::ZERO;
    }
    let bytes = literal_usage(i).value();
    CostingInteger::new((bytes - 1) / 8 + 1)
}

impl MemoryUsage for IBig {
    fn memory_usage(&self) -> CostingInteger {
        integer_usage(self)
    }
}

impl MemoryUsage for [u8] {
    fn memory_usage(&self) -> CostingInteger {
        byte_string_usage(self.len())
    }
}

impl MemoryUsage for str {
    fn memory_usage(&self) -> CostingInteger {
        CostingInteger::from(self.chars().count())
    }
}

impl MemoryUsage for BuiltinValue {
    fn memory_usage(&self) -> CostingInteger {
        CostingInteger::from(self.total_size())
    }
}

impl MemoryUsage for PlutusData {
    /// Four units per node plus the size of each integer and byte string.
    /// Walks the tree with an explicit stack, so arbitrarily nested Data is safe.
    fn memory_usage(&self) -> CostingInteger {
        let mut total = CostingInteger::ZERO;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            total = total + CostingInteger::new(DATA_NODE_USAGE);
            match node {
                PlutusData::Constr(_, fields) => pending.extend(fields),
                PlutusData::Map(entries) => {
                    for (k, v) in entries {
                        pending.push(k);
                        pending.push(v);
                    }
                }
                PlutusData::List(items) => pending.extend(items),
                PlutusData::Integer(i) => total = total + integer_usage(i),
                PlutusData::ByteString(b) => total = total + byte_string_usage(b.len()),
            }
        }
        total
    }
}

impl MemoryUsage for Constant {
    fn memory_usage(&self) -> CostingInteger {
        match self {
            Constant::Integer(i) => integer_usage(i),
            Constant::ByteString(b) => byte_string_usage(b.len()),
            Constant::String(s) => s.memory_usage(),
            Constant::Unit | Constant::Bool(_) => CostingInteger::ONE,
            Constant::Data(d) => d.memory_usage(),
            Constant::ProtoList(_, items) => items
                .iter()
                .map(MemoryUsage::memory_usage)
                .fold(CostingInteger::ONE, |acc, usage| acc + usage),
            Constant::ProtoPair(_, _, a, b) => {
                CostingInteger::ONE + a.memory_usage() + b.memory_usage()
            }
            Constant::Bls12_381G1Element(_) => CostingInteger::new(18),
            Constant::Bls12_381G2Element(_) => CostingInteger::new(36),
            Constant::Bls12_381MlResult(_) => CostingInteger::new(72),
            Constant::Value(v) => v.memory_usage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Type;
    use test_case::test_case;

    #[test_case("0", 1)]
    #[test_case("1", 1)]
    #[test_case("-1", 1)]
    #[test_case("18446744073709551615", 1 ; "2^64 - 1")]
    #[test_case("18446744073709551616", 2 ; "2^64")]
    #[test_case("-18446744073709551616", 2 ; "minus 2^64")]
    fn integer_words(literal: &str, expected: i64) {
        let i: IBig = literal.parse().unwrap();
        assert_eq!(integer_usage(&i), CostingInteger::new(expected));
    }

    #[test_case(0, 1)]
    #[test_case(1, 1)]
    #[test_case(8, 1)]
    #[test_case(9, 2)]
    #[test_case(64, 8)]
    fn byte_string_words(len: usize, expected: i64) {
        assert_eq!(byte_string_usage(len), CostingInteger::new(expected));
    }

    #[test_case("0", 0)]
    #[test_case("1", 1)]
    #[test_case("8", 1)]
    #[test_case("9", 2)]
    #[test_case("8192", 1024)]
    #[test_case("-5", 0)]
    fn widths_in_words(literal: &str, expected: i64) {
        let i: IBig = literal.parse().unwrap();
        assert_eq!(byte_count_as_words(&i), CostingInteger::new(expected));
    }

    #[test]
    fn literal_sizes_saturate() {
        assert_eq!(literal_usage(&IBig::from(-7)), CostingInteger::new(7));
        let huge: IBig = "100000000000000000000000000000".parse().unwrap();
        assert_eq!(literal_usage(&huge), CostingInteger::MAX);
    }

    #[test]
    fn strings_count_characters() {
        assert_eq!(Constant::String("héllo".into()).memory_usage(), CostingInteger::new(5));
    }

    #[test]
    fn composite_constants() {
        let list = Constant::list(Type::Integer, vec![Constant::integer(1), Constant::integer(2)]);
        assert_eq!(list.memory_usage(), CostingInteger::new(3));
        let pair = Constant::pair(Constant::Unit, Constant::byte_string(vec![0; 9]));
        assert_eq!(pair.memory_usage(), CostingInteger::new(4));
        assert_eq!(Constant::list(Type::Unit, vec![]).memory_usage(), CostingInteger::ONE);
    }

    #[test]
    fn data_nodes_cost_four_plus_content() {
        let data = PlutusData::constr(0, vec![PlutusData::integer(5), PlutusData::bytes(vec![])]);
        // constr node 4, integer node 4 + 1, bytes node 4 + 1
        assert_eq!(data.memory_usage(), CostingInteger::new(14));
    }

    #[test]
    fn deeply_nested_data_is_measured_iteratively() {
        let mut data = PlutusData::integer(0);
        for _ in 0..100_000 {
            data = PlutusData::List(vec![data]);
        }
        assert_eq!(data.memory_usage(), CostingInteger::new(100_001 * 4 + 1));
        // unwind by hand; the derived drop glue is recursive
        let mut current = data;
        while let PlutusData::List(mut items) = current {
            current = items.pop().unwrap_or(PlutusData::integer(0));
        }
    }
}
