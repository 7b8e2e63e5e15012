//! Conversions between integers and byte strings, and bit-level operations
//! on byte strings.
//!
//! Bits are numbered from the least significant bit of the last byte, so bit
//! `i` lives in byte `len - 1 - i / 8`. Shifts and rotations move bits
//! towards higher indices for positive amounts.

use dashu_int::ops::UnsignedAbs;
use dashu_int::{IBig, UBig};
use uplc_common::DefaultFunction;

use super::{arguments, bool_result, boolean, bytes, bytes_result, integer, integer_result, list};
use crate::error::BuiltinFailure;
use crate::value::Value;

/// Largest byte string `integerToByteString` and `replicateByte` produce
pub const MAX_BYTE_STRING_LENGTH: usize = 8192;

pub(super) fn call(fun: DefaultFunction, args: &[Value]) -> Result<Value, BuiltinFailure> {
    use DefaultFunction::*;
    match fun {
        IntegerToByteString => {
            let [big_endian, width, n] = arguments(args)?;
            integer_to_byte_string(boolean(big_endian)?, integer(width)?, integer(n)?)
                .map(bytes_result)
        }
        ByteStringToInteger => {
            let [big_endian, b] = arguments(args)?;
            let b = bytes(b)?;
            let n = if boolean(big_endian)? {
                UBig::from_be_bytes(b)
            } else {
                UBig::from_le_bytes(b)
            };
            Ok(integer_result(n))
        }
        AndByteString => logical(args, 0xff, |a, b| a & b),
        OrByteString => logical(args, 0x00, |a, b| a | b),
        XorByteString => logical(args, 0x00, |a, b| a ^ b),
        ComplementByteString => {
            let [b] = arguments(args)?;
            Ok(bytes_result(bytes(b)?.iter().map(|byte| !byte).collect::<Vec<_>>()))
        }
        ReadBit => {
            let [b, index] = arguments(args)?;
            let b = bytes(b)?;
            let (byte, bit) = bit_position(integer(index)?, b.len())?;
            Ok(bool_result(b[byte] & (1 << bit) != 0))
        }
        WriteBits => {
            let [b, indices, set] = arguments(args)?;
            let mut result = bytes(b)?.to_vec();
            let set = boolean(set)?;
            for index in list(indices)?.1 {
                let uplc_common::Constant::Integer(index) = index else {
                    return Err(BuiltinFailure::TypeMismatch {
                        expected: "integer",
                        actual: index.type_of().to_string(),
                    });
                };
                let (byte, bit) = bit_position(index, result.len())?;
                if set {
                    result[byte] |= 1 << bit;
                } else {
                    result[byte] &= !(1 << bit);
                }
            }
            Ok(bytes_result(result))
        }
        ReplicateByte => {
            let [count, byte] = arguments(args)?;
            let count = integer(count)?;
            let length = usize::try_from(count)
                .ok()
                .filter(|n| *n <= MAX_BYTE_STRING_LENGTH)
                .ok_or_else(|| {
                    BuiltinFailure::IntegerConversion(format!(
                        "cannot replicate a byte {count} times"
                    ))
                })?;
            let byte = integer(byte)?;
            let byte =
                u8::try_from(byte).map_err(|_| BuiltinFailure::ByteOutOfRange(byte.clone()))?;
            Ok(bytes_result(vec![byte; length]))
        }
        ShiftByteString => {
            let [b, amount] = arguments(args)?;
            Ok(bytes_result(shift(bytes(b)?, integer(amount)?)))
        }
        RotateByteString => {
            let [b, amount] = arguments(args)?;
            Ok(bytes_result(rotate(bytes(b)?, integer(amount)?)))
        }
        CountSetBits => {
            let [b] = arguments(args)?;
            let count: u32 = bytes(b)?.iter().map(|byte| byte.count_ones()).sum();
            Ok(integer_result(count))
        }
        FindFirstSetBit => {
            let [b] = arguments(args)?;
            let b = bytes(b)?;
            let first = b
                .iter()
                .rev()
                .enumerate()
                .find(|(_, byte)| **byte != 0)
                .map(|(i, byte)| IBig::from(i * 8 + byte.trailing_zeros() as usize))
                .unwrap_or(IBig::NEG_ONE);
            Ok(integer_result(first))
        }
        _ => Err(BuiltinFailure::UnsupportedPrimitive(fun)),
    }
}

fn integer_to_byte_string(
    big_endian: bool,
    width: &IBig,
    n: &IBig,
) -> Result<Vec<u8>, BuiltinFailure> {
    let width = usize::try_from(width)
        .ok()
        .filter(|w| *w <= MAX_BYTE_STRING_LENGTH)
        .ok_or_else(|| {
            BuiltinFailure::IntegerConversion(format!("invalid byte string width {width}"))
        })?;
    let magnitude = UBig::try_from(n.clone()).map_err(|_| {
        BuiltinFailure::IntegerConversion(format!("cannot convert negative integer {n}"))
    })?;

    let mut encoded = magnitude.to_be_bytes().into_vec();
    let limit = if width == 0 { MAX_BYTE_STRING_LENGTH } else { width };
    if encoded.len() > limit {
        return Err(BuiltinFailure::IntegerConversion(format!(
            "{n} does not fit in {limit} bytes"
        )));
    }
    if encoded.len() < width {
        let mut padded = vec![0; width - encoded.len()];
        padded.append(&mut encoded);
        encoded = padded;
    }
    if !big_endian {
        encoded.reverse();
    }
    Ok(encoded)
}

/// Apply a byte operation pointwise. Without padding the result has the
/// length of the shorter input; with padding the shorter input is extended
/// at the end with `identity` bytes.
fn logical(
    args: &[Value],
    identity: u8,
    op: impl Fn(u8, u8) -> u8,
) -> Result<Value, BuiltinFailure> {
    let [pad, a, b] = arguments(args)?;
    let (a, b) = (bytes(a)?, bytes(b)?);
    let length = if boolean(pad)? {
        a.len().max(b.len())
    } else {
        a.len().min(b.len())
    };
    let result: Vec<u8> = (0..length)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(identity);
            let y = b.get(i).copied().unwrap_or(identity);
            op(x, y)
        })
        .collect();
    Ok(bytes_result(result))
}

/// Byte offset and bit within that byte for bit `index`
fn bit_position(index: &IBig, length: usize) -> Result<(usize, u8), BuiltinFailure> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < length * 8)
        .map(|i| (length - 1 - i / 8, (i % 8) as u8))
        .ok_or_else(|| BuiltinFailure::IndexOutOfBounds {
            index: index.clone(),
            length: length * 8,
        })
}

fn shift(b: &[u8], amount: &IBig) -> Vec<u8> {
    let bits = b.len() * 8;
    match usize::try_from(amount.clone().unsigned_abs()) {
        Ok(n) if n < bits => {
            if *amount >= IBig::ZERO {
                shift_towards_front(b, n)
            } else {
                shift_towards_back(b, n)
            }
        }
        _ => vec![0; b.len()],
    }
}

fn rotate(b: &[u8], amount: &IBig) -> Vec<u8> {
    let bits = b.len() * 8;
    if bits == 0 {
        return Vec::new();
    }
    let modulus = IBig::from(bits);
    let turn = ((amount % &modulus) + &modulus) % &modulus;
    let k = usize::try_from(&turn).unwrap_or(0);
    if k == 0 {
        return b.to_vec();
    }
    let front = shift_towards_front(b, k);
    let back = shift_towards_back(b, bits - k);
    front.iter().zip(&back).map(|(x, y)| x | y).collect()
}

/// Left shift of the whole string viewed as a big-endian number
fn shift_towards_front(b: &[u8], n: usize) -> Vec<u8> {
    let (bytes_over, bits_over) = (n / 8, (n % 8) as u32);
    let at = |i: usize| b.get(i).copied().unwrap_or(0);
    (0..b.len())
        .map(|i| {
            let high = at(i + bytes_over) << bits_over;
            let low = if bits_over == 0 {
                0
            } else {
                at(i + bytes_over + 1) >> (8 - bits_over)
            };
            high | low
        })
        .collect()
}

fn shift_towards_back(b: &[u8], n: usize) -> Vec<u8> {
    let (bytes_over, bits_over) = (n / 8, (n % 8) as u32);
    let at = |i: usize, back: usize| i.checked_sub(back).map_or(0, |j| b[j]);
    (0..b.len())
        .map(|i| {
            let low = at(i, bytes_over) >> bits_over;
            let high = if bits_over == 0 {
                0
            } else {
                at(i, bytes_over + 1) << (8 - bits_over)
            };
            high | low
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use test_case::test_case;
    use uplc_common::{Constant, Type};

    fn flag(b: bool) -> Value {
        con(Constant::Bool(b))
    }

    fn hex_bytes(s: &str) -> Constant {
        Constant::byte_string(hex::decode(s).unwrap())
    }

    #[test_case(true, 0, 0, "" ; "zero is empty")]
    #[test_case(true, 0, 0x1234, "1234" ; "minimal big endian")]
    #[test_case(false, 0, 0x1234, "3412" ; "minimal little endian")]
    #[test_case(true, 4, 0x1234, "00001234" ; "padded big endian")]
    #[test_case(false, 4, 0x1234, "34120000" ; "padded little endian")]
    fn integer_to_byte_string(big_endian: bool, width: i64, n: i64, expected: &str) {
        assert_eq!(
            run(DefaultFunction::IntegerToByteString, vec![flag(big_endian), int(width), int(n)]),
            Ok(hex_bytes(expected))
        );
    }

    #[test_case(1, 0x1234 ; "too narrow")]
    #[test_case(-1, 1 ; "negative width")]
    #[test_case(8193, 1 ; "width over the limit")]
    #[test_case(0, -5 ; "negative integer")]
    fn integer_to_byte_string_failures(width: i64, n: i64) {
        let result = run(
            DefaultFunction::IntegerToByteString,
            vec![flag(true), int(width), int(n)],
        );
        assert!(matches!(result, Err(BuiltinFailure::IntegerConversion(_))));
    }

    #[test]
    fn byte_string_to_integer_honours_endianness() {
        assert_eq!(
            run(DefaultFunction::ByteStringToInteger, vec![flag(true), bs("0102")]),
            Ok(Constant::integer(0x0102))
        );
        assert_eq!(
            run(DefaultFunction::ByteStringToInteger, vec![flag(false), bs("0102")]),
            Ok(Constant::integer(0x0201))
        );
        assert_eq!(
            run(DefaultFunction::ByteStringToInteger, vec![flag(true), bs("")]),
            Ok(Constant::integer(0))
        );
    }

    #[test_case(DefaultFunction::AndByteString, false, "0fff", "ff", "0f" ; "and truncates")]
    #[test_case(DefaultFunction::AndByteString, true, "0fff", "ff", "0fff" ; "and pads")]
    #[test_case(DefaultFunction::OrByteString, true, "f0", "0f0f", "ff0f" ; "or pads")]
    #[test_case(DefaultFunction::XorByteString, false, "ff00", "0ff0", "f0f0" ; "xor")]
    fn logical_operations(fun: DefaultFunction, pad: bool, a: &str, b: &str, expected: &str) {
        assert_eq!(run(fun, vec![flag(pad), bs(a), bs(b)]), Ok(hex_bytes(expected)));
    }

    #[test_case("0001", 0, true)]
    #[test_case("0001", 1, false)]
    #[test_case("8000", 15, true)]
    #[test_case("0100", 8, true)]
    fn read_bit(b: &str, index: i64, expected: bool) {
        assert_eq!(
            run(DefaultFunction::ReadBit, vec![bs(b), int(index)]),
            Ok(Constant::Bool(expected))
        );
    }

    #[test]
    fn read_bit_out_of_range() {
        assert_eq!(
            run(DefaultFunction::ReadBit, vec![bs("00"), int(8)]),
            Err(BuiltinFailure::IndexOutOfBounds {
                index: IBig::from(8),
                length: 8
            })
        );
    }

    #[test]
    fn write_bits_sets_and_clears() {
        let indices = |xs: Vec<i64>| {
            con(Constant::list(
                Type::Integer,
                xs.into_iter().map(Constant::integer).collect(),
            ))
        };
        assert_eq!(
            run(DefaultFunction::WriteBits, vec![bs("0000"), indices(vec![0, 9]), flag(true)]),
            Ok(hex_bytes("0201"))
        );
        assert_eq!(
            run(DefaultFunction::WriteBits, vec![bs("ffff"), indices(vec![15]), flag(false)]),
            Ok(hex_bytes("7fff"))
        );
        assert!(
            run(DefaultFunction::WriteBits, vec![bs("ff"), indices(vec![8]), flag(false)]).is_err()
        );
    }

    #[test]
    fn replicate_byte_limits() {
        assert_eq!(
            run(DefaultFunction::ReplicateByte, vec![int(3), int(0xab)]),
            Ok(hex_bytes("ababab"))
        );
        assert!(run(DefaultFunction::ReplicateByte, vec![int(8193), int(0)]).is_err());
        assert_eq!(
            run(DefaultFunction::ReplicateByte, vec![int(1), int(256)]),
            Err(BuiltinFailure::ByteOutOfRange(IBig::from(256)))
        );
    }

    #[test_case("0f0f", 4, "f0f0" ; "left by a nibble")]
    #[test_case("0f0f", -4, "00f0" ; "right by a nibble")]
    #[test_case("0001", 9, "0200" ; "across bytes")]
    #[test_case("ffff", 16, "0000" ; "everything out")]
    #[test_case("ffff", -100, "0000" ; "everything out backwards")]
    fn shift_byte_string(b: &str, amount: i64, expected: &str) {
        assert_eq!(
            run(DefaultFunction::ShiftByteString, vec![bs(b), int(amount)]),
            Ok(hex_bytes(expected))
        );
    }

    #[test_case("8001", 1, "0003" ; "wraps the top bit")]
    #[test_case("8001", -1, "c000" ; "wraps the bottom bit")]
    #[test_case("1234", 16, "1234" ; "full turn")]
    #[test_case("1234", -12, "2341" ; "negative turn")]
    #[test_case("", 3, "" ; "empty")]
    fn rotate_byte_string(b: &str, amount: i64, expected: &str) {
        assert_eq!(
            run(DefaultFunction::RotateByteString, vec![bs(b), int(amount)]),
            Ok(hex_bytes(expected))
        );
    }

    #[test_case("", 0, -1)]
    #[test_case("0000", 0, -1)]
    #[test_case("0100", 1, 8)]
    #[test_case("ff80", 9, 7)]
    fn count_and_find_bits(b: &str, count: i64, first: i64) {
        assert_eq!(run(DefaultFunction::CountSetBits, vec![bs(b)]), Ok(Constant::integer(count)));
        assert_eq!(
            run(DefaultFunction::FindFirstSetBit, vec![bs(b)]),
            Ok(Constant::integer(first))
        );
    }
}
