//! Builtin implementations.
//!
//! Every builtin receives its saturated argument list and either produces a
//! value or fails with a [`BuiltinFailure`]. Arguments are unlifted with the
//! typed accessors below, so an ill-typed argument is an ordinary failure.

mod bitwise;
mod bytestring;
mod crypto;
mod data;
mod integer;
mod value;

use dashu_int::IBig;
use tracing::trace;
use uplc_common::bls::{G1Element, G2Element, MlResult};
use uplc_common::{BuiltinValue, Constant, DefaultFunction, PlutusData, Type};

use crate::error::BuiltinFailure;
use crate::logger::Logger;
use crate::primitives::ExternalPrimitives;
use crate::value::Value;

/// Builtins that can only run with an [`ExternalPrimitives`] backend
pub fn needs_external_primitives(fun: DefaultFunction) -> bool {
    use DefaultFunction::*;
    matches!(
        fun,
        VerifyEcdsaSecp256k1Signature
            | VerifySchnorrSecp256k1Signature
            | Bls12_381_G1_Add
            | Bls12_381_G1_Neg
            | Bls12_381_G1_ScalarMul
            | Bls12_381_G1_Equal
            | Bls12_381_G1_Compress
            | Bls12_381_G1_Uncompress
            | Bls12_381_G1_HashToGroup
            | Bls12_381_G2_Add
            | Bls12_381_G2_Neg
            | Bls12_381_G2_ScalarMul
            | Bls12_381_G2_Equal
            | Bls12_381_G2_Compress
            | Bls12_381_G2_Uncompress
            | Bls12_381_G2_HashToGroup
            | Bls12_381_MillerLoop
            | Bls12_381_MulMlResult
            | Bls12_381_FinalVerify
    )
}

/// Run a saturated builtin
pub fn call(
    fun: DefaultFunction,
    args: &[Value],
    primitives: Option<&dyn ExternalPrimitives>,
    logger: &mut dyn Logger,
) -> Result<Value, BuiltinFailure> {
    use DefaultFunction::*;
    trace!("Calling builtin {fun} with {} arguments", args.len());

    if needs_external_primitives(fun) {
        let backend = primitives.ok_or(BuiltinFailure::UnsupportedPrimitive(fun))?;
        return crypto::external(fun, args, backend);
    }

    match fun {
        AddInteger | SubtractInteger | MultiplyInteger | DivideInteger | QuotientInteger
        | RemainderInteger | ModInteger | EqualsInteger | LessThanInteger
        | LessThanEqualsInteger | ExpModInteger => integer::call(fun, args),

        AppendByteString | ConsByteString | SliceByteString | LengthOfByteString
        | IndexByteString | EqualsByteString | LessThanByteString | LessThanEqualsByteString
        | AppendString | EqualsString | EncodeUtf8 | DecodeUtf8 => bytestring::call(fun, args),

        Sha2_256 | Sha3_256 | Blake2b_224 | Blake2b_256 | Keccak_256 | Ripemd_160
        | VerifyEd25519Signature => crypto::call(fun, args),

        IfThenElse => {
            let [condition, then, otherwise] = arguments(args)?;
            Ok(if boolean(condition)? { then } else { otherwise }.clone())
        }
        ChooseUnit => {
            let [u, result] = arguments(args)?;
            unit(u)?;
            Ok(result.clone())
        }
        Trace => {
            let [message, result] = arguments(args)?;
            logger.log(string(message)?.to_string());
            Ok(result.clone())
        }

        FstPair | SndPair | ChooseList | MkCons | HeadList | TailList | NullList | DropList
        | ChooseData | ConstrData | MapData | ListData | IData | BData | UnConstrData
        | UnMapData | UnListData | UnIData | UnBData | EqualsData | MkPairData | MkNilData
        | MkNilPairData => data::call(fun, args),

        IntegerToByteString | ByteStringToInteger | AndByteString | OrByteString
        | XorByteString | ComplementByteString | ReadBit | WriteBits | ReplicateByte
        | ShiftByteString | RotateByteString | CountSetBits | FindFirstSetBit => {
            bitwise::call(fun, args)
        }

        InsertCoin | LookupCoin | UnionValue | ValueContains | ValueData | UnValueData
        | ScaleValue => value::call(fun, args),

        // routed to the external backend above
        VerifyEcdsaSecp256k1Signature
        | VerifySchnorrSecp256k1Signature
        | Bls12_381_G1_Add
        | Bls12_381_G1_Neg
        | Bls12_381_G1_ScalarMul
        | Bls12_381_G1_Equal
        | Bls12_381_G1_Compress
        | Bls12_381_G1_Uncompress
        | Bls12_381_G1_HashToGroup
        | Bls12_381_G2_Add
        | Bls12_381_G2_Neg
        | Bls12_381_G2_ScalarMul
        | Bls12_381_G2_Equal
        | Bls12_381_G2_Compress
        | Bls12_381_G2_Uncompress
        | Bls12_381_G2_HashToGroup
        | Bls12_381_MillerLoop
        | Bls12_381_MulMlResult
        | Bls12_381_FinalVerify => Err(BuiltinFailure::UnsupportedPrimitive(fun)),
    }
}

// ---- Unlifting

/// Borrow exactly `N` arguments
pub(crate) fn arguments<const N: usize>(args: &[Value]) -> Result<&[Value; N], BuiltinFailure> {
    args.try_into().map_err(|_| BuiltinFailure::WrongArgumentCount {
        expected: N,
        actual: args.len(),
    })
}

fn describe(value: &Value) -> String {
    match value {
        Value::Con(c) => c.type_of().to_string(),
        Value::Delay(..) => "delayed term".to_string(),
        Value::Lambda { .. } => "lambda".to_string(),
        Value::Builtin(runtime) => format!("partial builtin {}", runtime.fun()),
        Value::Constr(tag, _) => format!("constructor {tag}"),
    }
}

fn mismatch(expected: &'static str, value: &Value) -> BuiltinFailure {
    BuiltinFailure::TypeMismatch {
        expected,
        actual: describe(value),
    }
}

macro_rules! unlift {
    ($name:ident, $expected:literal, $out:ty, $pattern:pat => $result:expr) => {
        pub(crate) fn $name(value: &Value) -> Result<$out, BuiltinFailure> {
            match value.as_constant() {
                Some($pattern) => Ok($result),
                _ => Err(mismatch($expected, value)),
            }
        }
    };
}

unlift!(integer, "integer", &IBig, Constant::Integer(i) => i);
unlift!(bytes, "bytestring", &[u8], Constant::ByteString(b) => b.as_slice());
unlift!(string, "string", &str, Constant::String(s) => s.as_str());
unlift!(boolean, "bool", bool, Constant::Bool(b) => *b);
unlift!(unit, "unit", (), Constant::Unit => ());
unlift!(data_value, "data", &PlutusData, Constant::Data(d) => d);
unlift!(list, "list", (&Type, &[Constant]), Constant::ProtoList(t, items) => (t, items.as_slice()));
unlift!(pair, "pair", (&Constant, &Constant), Constant::ProtoPair(_, _, a, b) => (a.as_ref(), b.as_ref()));
unlift!(multi_asset, "value", &BuiltinValue, Constant::Value(v) => v);
unlift!(g1, "bls12_381_G1_element", &G1Element, Constant::Bls12_381G1Element(e) => e);
unlift!(g2, "bls12_381_G2_element", &G2Element, Constant::Bls12_381G2Element(e) => e);
unlift!(ml_result, "bls12_381_mlresult", &MlResult, Constant::Bls12_381MlResult(e) => e);

// ---- Lifting

pub(crate) fn integer_result(i: impl Into<IBig>) -> Value {
    Value::con(Constant::Integer(i.into()))
}

pub(crate) fn bytes_result(b: impl Into<Vec<u8>>) -> Value {
    Value::con(Constant::ByteString(b.into()))
}

pub(crate) fn bool_result(b: bool) -> Value {
    Value::con(Constant::Bool(b))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::logger::Log;

    pub fn int(n: i64) -> Value {
        integer_result(n)
    }

    pub fn big(literal: &str) -> Value {
        integer_result(literal.parse::<IBig>().unwrap())
    }

    pub fn bs(hex_literal: &str) -> Value {
        bytes_result(hex::decode(hex_literal).unwrap())
    }

    pub fn con(constant: Constant) -> Value {
        Value::con(constant)
    }

    /// Run a builtin with no external backend and hand back its constant result
    pub fn run(fun: DefaultFunction, args: Vec<Value>) -> Result<Constant, BuiltinFailure> {
        let mut log = Log::new();
        let value = call(fun, &args, None, &mut log)?;
        value
            .as_constant()
            .cloned()
            .ok_or_else(|| BuiltinFailure::Primitive("non-constant result".to_string()))
    }
}
