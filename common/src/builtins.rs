//! The catalog of built-in functions: names, arities and type-argument counts.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown builtin name '{0}'")]
pub struct UnknownBuiltinName(pub String);

macro_rules! default_functions {
    ($($variant:ident => $name:literal, forces: $forces:literal, arity: $arity:literal;)*) => {
        /// A built-in function of the language
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum DefaultFunction {
            $($variant,)*
        }

        impl DefaultFunction {
            /// Every builtin, in declaration order
            pub const ALL: &'static [DefaultFunction] = &[$(DefaultFunction::$variant,)*];

            /// The camel-case name used in cost models and surface syntax
            pub fn name(self) -> &'static str {
                match self {
                    $(DefaultFunction::$variant => $name,)*
                }
            }

            /// Number of `force`s required before term arguments are accepted
            pub fn force_count(self) -> usize {
                match self {
                    $(DefaultFunction::$variant => $forces,)*
                }
            }

            /// Number of term arguments
            pub fn arity(self) -> usize {
                match self {
                    $(DefaultFunction::$variant => $arity,)*
                }
            }
        }

        impl FromStr for DefaultFunction {
            type Err = UnknownBuiltinName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(DefaultFunction::$variant),)*
                    other => Err(UnknownBuiltinName(other.to_string())),
                }
            }
        }
    };
}

default_functions! {
    // Integers
    AddInteger => "addInteger", forces: 0, arity: 2;
    SubtractInteger => "subtractInteger", forces: 0, arity: 2;
    MultiplyInteger => "multiplyInteger", forces: 0, arity: 2;
    DivideInteger => "divideInteger", forces: 0, arity: 2;
    QuotientInteger => "quotientInteger", forces: 0, arity: 2;
    RemainderInteger => "remainderInteger", forces: 0, arity: 2;
    ModInteger => "modInteger", forces: 0, arity: 2;
    EqualsInteger => "equalsInteger", forces: 0, arity: 2;
    LessThanInteger => "lessThanInteger", forces: 0, arity: 2;
    LessThanEqualsInteger => "lessThanEqualsInteger", forces: 0, arity: 2;
    ExpModInteger => "expModInteger", forces: 0, arity: 3;
    // Byte strings
    AppendByteString => "appendByteString", forces: 0, arity: 2;
    ConsByteString => "consByteString", forces: 0, arity: 2;
    SliceByteString => "sliceByteString", forces: 0, arity: 3;
    LengthOfByteString => "lengthOfByteString", forces: 0, arity: 1;
    IndexByteString => "indexByteString", forces: 0, arity: 2;
    EqualsByteString => "equalsByteString", forces: 0, arity: 2;
    LessThanByteString => "lessThanByteString", forces: 0, arity: 2;
    LessThanEqualsByteString => "lessThanEqualsByteString", forces: 0, arity: 2;
    // Hashes and signatures
    Sha2_256 => "sha2_256", forces: 0, arity: 1;
    Sha3_256 => "sha3_256", forces: 0, arity: 1;
    Blake2b_224 => "blake2b_224", forces: 0, arity: 1;
    Blake2b_256 => "blake2b_256", forces: 0, arity: 1;
    Keccak_256 => "keccak_256", forces: 0, arity: 1;
    Ripemd_160 => "ripemd_160", forces: 0, arity: 1;
    VerifyEd25519Signature => "verifyEd25519Signature", forces: 0, arity: 3;
    VerifyEcdsaSecp256k1Signature => "verifyEcdsaSecp256k1Signature", forces: 0, arity: 3;
    VerifySchnorrSecp256k1Signature => "verifySchnorrSecp256k1Signature", forces: 0, arity: 3;
    // Strings
    AppendString => "appendString", forces: 0, arity: 2;
    EqualsString => "equalsString", forces: 0, arity: 2;
    EncodeUtf8 => "encodeUtf8", forces: 0, arity: 1;
    DecodeUtf8 => "decodeUtf8", forces: 0, arity: 1;
    // Control
    IfThenElse => "ifThenElse", forces: 1, arity: 3;
    ChooseUnit => "chooseUnit", forces: 1, arity: 2;
    Trace => "trace", forces: 1, arity: 2;
    // Pairs and lists
    FstPair => "fstPair", forces: 2, arity: 1;
    SndPair => "sndPair", forces: 2, arity: 1;
    ChooseList => "chooseList", forces: 2, arity: 3;
    MkCons => "mkCons", forces: 1, arity: 2;
    HeadList => "headList", forces: 1, arity: 1;
    TailList => "tailList", forces: 1, arity: 1;
    NullList => "nullList", forces: 1, arity: 1;
    DropList => "dropList", forces: 1, arity: 2;
    // Data
    ChooseData => "chooseData", forces: 1, arity: 6;
    ConstrData => "constrData", forces: 0, arity: 2;
    MapData => "mapData", forces: 0, arity: 1;
    ListData => "listData", forces: 0, arity: 1;
    IData => "iData", forces: 0, arity: 1;
    BData => "bData", forces: 0, arity: 1;
    UnConstrData => "unConstrData", forces: 0, arity: 1;
    UnMapData => "unMapData", forces: 0, arity: 1;
    UnListData => "unListData", forces: 0, arity: 1;
    UnIData => "unIData", forces: 0, arity: 1;
    UnBData => "unBData", forces: 0, arity: 1;
    EqualsData => "equalsData", forces: 0, arity: 2;
    MkPairData => "mkPairData", forces: 0, arity: 2;
    MkNilData => "mkNilData", forces: 0, arity: 1;
    MkNilPairData => "mkNilPairData", forces: 0, arity: 1;
    // BLS12-381
    Bls12_381_G1_Add => "bls12_381_G1_add", forces: 0, arity: 2;
    Bls12_381_G1_Neg => "bls12_381_G1_neg", forces: 0, arity: 1;
    Bls12_381_G1_ScalarMul => "bls12_381_G1_scalarMul", forces: 0, arity: 2;
    Bls12_381_G1_Equal => "bls12_381_G1_equal", forces: 0, arity: 2;
    Bls12_381_G1_Compress => "bls12_381_G1_compress", forces: 0, arity: 1;
    Bls12_381_G1_Uncompress => "bls12_381_G1_uncompress", forces: 0, arity: 1;
    Bls12_381_G1_HashToGroup => "bls12_381_G1_hashToGroup", forces: 0, arity: 2;
    Bls12_381_G2_Add => "bls12_381_G2_add", forces: 0, arity: 2;
    Bls12_381_G2_Neg => "bls12_381_G2_neg", forces: 0, arity: 1;
    Bls12_381_G2_ScalarMul => "bls12_381_G2_scalarMul", forces: 0, arity: 2;
    Bls12_381_G2_Equal => "bls12_381_G2_equal", forces: 0, arity: 2;
    Bls12_381_G2_Compress => "bls12_381_G2_compress", forces: 0, arity: 1;
    Bls12_381_G2_Uncompress => "bls12_381_G2_uncompress", forces: 0, arity: 1;
    Bls12_381_G2_HashToGroup => "bls12_381_G2_hashToGroup", forces: 0, arity: 2;
    Bls12_381_MillerLoop => "bls12_381_millerLoop", forces: 0, arity: 2;
    Bls12_381_MulMlResult => "bls12_381_mulMlResult", forces: 0, arity: 2;
    Bls12_381_FinalVerify => "bls12_381_finalVerify", forces: 0, arity: 2;
    // Bitwise
    IntegerToByteString => "integerToByteString", forces: 0, arity: 3;
    ByteStringToInteger => "byteStringToInteger", forces: 0, arity: 2;
    AndByteString => "andByteString", forces: 0, arity: 3;
    OrByteString => "orByteString", forces: 0, arity: 3;
    XorByteString => "xorByteString", forces: 0, arity: 3;
    ComplementByteString => "complementByteString", forces: 0, arity: 1;
    ReadBit => "readBit", forces: 0, arity: 2;
    WriteBits => "writeBits", forces: 0, arity: 3;
    ReplicateByte => "replicateByte", forces: 0, arity: 2;
    ShiftByteString => "shiftByteString", forces: 0, arity: 2;
    RotateByteString => "rotateByteString", forces: 0, arity: 2;
    CountSetBits => "countSetBits", forces: 0, arity: 1;
    FindFirstSetBit => "findFirstSetBit", forces: 0, arity: 1;
    // Multi-asset values
    InsertCoin => "insertCoin", forces: 0, arity: 4;
    LookupCoin => "lookupCoin", forces: 0, arity: 3;
    UnionValue => "unionValue", forces: 0, arity: 2;
    ValueContains => "valueContains", forces: 0, arity: 2;
    ValueData => "valueData", forces: 0, arity: 1;
    UnValueData => "unValueData", forces: 0, arity: 1;
    ScaleValue => "scaleValue", forces: 0, arity: 2;
}

impl fmt::Display for DefaultFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl serde::Serialize for DefaultFunction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for DefaultFunction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
