//! Byte string and string builtins.

use dashu_int::IBig;
use uplc_common::{Constant, DefaultFunction};

use super::{arguments, bool_result, bytes, bytes_result, integer, integer_result, string};
use crate::error::BuiltinFailure;
use crate::value::Value;

pub(super) fn call(fun: DefaultFunction, args: &[Value]) -> Result<Value, BuiltinFailure> {
    use DefaultFunction::*;
    match fun {
        AppendByteString => {
            let [a, b] = arguments(args)?;
            Ok(bytes_result([bytes(a)?, bytes(b)?].concat()))
        }
        ConsByteString => {
            let [byte, tail] = arguments(args)?;
            let byte = integer(byte)?;
            let byte =
                u8::try_from(byte).map_err(|_| BuiltinFailure::ByteOutOfRange(byte.clone()))?;
            let tail = bytes(tail)?;
            let mut result = Vec::with_capacity(tail.len() + 1);
            result.push(byte);
            result.extend_from_slice(tail);
            Ok(bytes_result(result))
        }
        SliceByteString => {
            let [start, length, b] = arguments(args)?;
            Ok(bytes_result(slice(integer(start)?, integer(length)?, bytes(b)?)))
        }
        LengthOfByteString => {
            let [b] = arguments(args)?;
            Ok(integer_result(bytes(b)?.len()))
        }
        IndexByteString => {
            let [b, index] = arguments(args)?;
            let (b, index) = (bytes(b)?, integer(index)?);
            usize::try_from(index)
                .ok()
                .and_then(|i| b.get(i))
                .map(|byte| integer_result(*byte))
                .ok_or_else(|| BuiltinFailure::IndexOutOfBounds {
                    index: index.clone(),
                    length: b.len(),
                })
        }
        EqualsByteString => compare(args, |a, b| a == b),
        LessThanByteString => compare(args, |a, b| a < b),
        LessThanEqualsByteString => compare(args, |a, b| a <= b),

        AppendString => {
            let [a, b] = arguments(args)?;
            Ok(Value::con(Constant::String([string(a)?, string(b)?].concat())))
        }
        EqualsString => {
            let [a, b] = arguments(args)?;
            Ok(bool_result(string(a)? == string(b)?))
        }
        EncodeUtf8 => {
            let [s] = arguments(args)?;
            Ok(bytes_result(string(s)?.as_bytes()))
        }
        DecodeUtf8 => {
            let [b] = arguments(args)?;
            let decoded = std::str::from_utf8(bytes(b)?).map_err(|_| BuiltinFailure::InvalidUtf8)?;
            Ok(Value::con(Constant::String(decoded.to_string())))
        }
        _ => Err(BuiltinFailure::UnsupportedPrimitive(fun)),
    }
}

fn compare(args: &[Value], op: impl Fn(&[u8], &[u8]) -> bool) -> Result<Value, BuiltinFailure> {
    let [a, b] = arguments(args)?;
    Ok(bool_result(op(bytes(a)?, bytes(b)?)))
}

/// Clamp an integer into `0..=len`
pub(super) fn clamp(i: &IBig, len: usize) -> usize {
    if *i <= IBig::ZERO {
        0
    } else {
        usize::try_from(i).map_or(len, |i| i.min(len))
    }
}

/// `length` bytes from `start`, with both ends clamped to the string
fn slice<'a>(start: &IBig, length: &IBig, b: &'a [u8]) -> &'a [u8] {
    let from = clamp(start, b.len());
    let to = clamp(&(start + length), b.len());
    if to <= from {
        &[]
    } else {
        &b[from..to]
    }
}
