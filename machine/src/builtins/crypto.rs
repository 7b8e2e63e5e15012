//! Hashes, signature checks and the builtins served by [`ExternalPrimitives`].

use blake2::digest::consts::{U28, U32};
use blake2::Blake2b;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use sha3::{Keccak256, Sha3_256 as Sha3};
use uplc_common::{Constant, DefaultFunction};

use super::{arguments, bool_result, bytes, bytes_result, g1, g2, integer, ml_result};
use crate::error::BuiltinFailure;
use crate::primitives::ExternalPrimitives;
use crate::value::Value;

const ED25519_KEY_LENGTH: usize = 32;
const ED25519_SIGNATURE_LENGTH: usize = 64;
const SECP256K1_ECDSA_KEY_LENGTH: usize = 33;
const SECP256K1_ECDSA_MESSAGE_LENGTH: usize = 32;
const SECP256K1_SCHNORR_KEY_LENGTH: usize = 32;
const SECP256K1_SIGNATURE_LENGTH: usize = 64;

fn digest<D: Digest>(input: &[u8]) -> Vec<u8> {
    D::digest(input).to_vec()
}

pub(super) fn call(fun: DefaultFunction, args: &[Value]) -> Result<Value, BuiltinFailure> {
    use DefaultFunction::*;
    if fun == VerifyEd25519Signature {
        let [key, message, signature] = arguments(args)?;
        return verify_ed25519(bytes(key)?, bytes(message)?, bytes(signature)?).map(bool_result);
    }

    let [input] = arguments(args)?;
    let input = bytes(input)?;
    let hash = match fun {
        Sha2_256 => digest::<Sha256>(input),
        Sha3_256 => digest::<Sha3>(input),
        Blake2b_224 => digest::<Blake2b<U28>>(input),
        Blake2b_256 => digest::<Blake2b<U32>>(input),
        Keccak_256 => digest::<Keccak256>(input),
        Ripemd_160 => digest::<ripemd::Ripemd160>(input),
        _ => return Err(BuiltinFailure::UnsupportedPrimitive(fun)),
    };
    Ok(bytes_result(hash))
}

fn check_length(name: &'static str, bytes: &[u8], expected: usize) -> Result<(), BuiltinFailure> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(BuiltinFailure::InvalidLength {
            name,
            expected,
            actual: bytes.len(),
        })
    }
}

fn verify_ed25519(key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, BuiltinFailure> {
    let key: &[u8; ED25519_KEY_LENGTH] = key.try_into().map_err(|_| BuiltinFailure::InvalidLength {
        name: "ed25519 public key",
        expected: ED25519_KEY_LENGTH,
        actual: key.len(),
    })?;
    let signature: &[u8; ED25519_SIGNATURE_LENGTH] =
        signature.try_into().map_err(|_| BuiltinFailure::InvalidLength {
            name: "ed25519 signature",
            expected: ED25519_SIGNATURE_LENGTH,
            actual: signature.len(),
        })?;
    let key = VerifyingKey::from_bytes(key).map_err(|e| BuiltinFailure::Primitive(e.to_string()))?;
    let signature = Signature::from_bytes(signature);
    Ok(key.verify(message, &signature).is_ok())
}

/// Dispatch a builtin to the injected backend
pub(super) fn external(
    fun: DefaultFunction,
    args: &[Value],
    backend: &dyn ExternalPrimitives,
) -> Result<Value, BuiltinFailure> {
    use DefaultFunction::*;
    let failed = BuiltinFailure::Primitive;
    let g1_result = |e| Value::con(Constant::Bls12_381G1Element(e));
    let g2_result = |e| Value::con(Constant::Bls12_381G2Element(e));

    match fun {
        VerifyEcdsaSecp256k1Signature => {
            let [key, message, signature] = arguments(args)?;
            let (key, message, signature) = (bytes(key)?, bytes(message)?, bytes(signature)?);
            check_length("secp256k1 public key", key, SECP256K1_ECDSA_KEY_LENGTH)?;
            check_length("secp256k1 message hash", message, SECP256K1_ECDSA_MESSAGE_LENGTH)?;
            check_length("secp256k1 signature", signature, SECP256K1_SIGNATURE_LENGTH)?;
            backend.verify_ecdsa_secp256k1(key, message, signature).map(bool_result).map_err(failed)
        }
        VerifySchnorrSecp256k1Signature => {
            let [key, message, signature] = arguments(args)?;
            let (key, message, signature) = (bytes(key)?, bytes(message)?, bytes(signature)?);
            check_length("schnorr public key", key, SECP256K1_SCHNORR_KEY_LENGTH)?;
            check_length("schnorr signature", signature, SECP256K1_SIGNATURE_LENGTH)?;
            backend
                .verify_schnorr_secp256k1(key, message, signature)
                .map(bool_result)
                .map_err(failed)
        }

        Bls12_381_G1_Add => {
            let [a, b] = arguments(args)?;
            backend.g1_add(g1(a)?, g1(b)?).map(g1_result).map_err(failed)
        }
        Bls12_381_G1_Neg => {
            let [a] = arguments(args)?;
            backend.g1_neg(g1(a)?).map(g1_result).map_err(failed)
        }
        Bls12_381_G1_ScalarMul => {
            let [scalar, a] = arguments(args)?;
            backend.g1_scalar_mul(integer(scalar)?, g1(a)?).map(g1_result).map_err(failed)
        }
        Bls12_381_G1_Equal => {
            let [a, b] = arguments(args)?;
            backend.g1_equal(g1(a)?, g1(b)?).map(bool_result).map_err(failed)
        }
        Bls12_381_G1_Compress => {
            let [a] = arguments(args)?;
            backend.g1_compress(g1(a)?).map(bytes_result).map_err(failed)
        }
        Bls12_381_G1_Uncompress => {
            let [b] = arguments(args)?;
            backend.g1_uncompress(bytes(b)?).map(g1_result).map_err(failed)
        }
        Bls12_381_G1_HashToGroup => {
            let [message, dst] = arguments(args)?;
            backend.g1_hash_to_group(bytes(message)?, bytes(dst)?).map(g1_result).map_err(failed)
        }

        Bls12_381_G2_Add => {
            let [a, b] = arguments(args)?;
            backend.g2_add(g2(a)?, g2(b)?).map(g2_result).map_err(failed)
        }
        Bls12_381_G2_Neg => {
            let [a] = arguments(args)?;
            backend.g2_neg(g2(a)?).map(g2_result).map_err(failed)
        }
        Bls12_381_G2_ScalarMul => {
            let [scalar, a] = arguments(args)?;
            backend.g2_scalar_mul(integer(scalar)?, g2(a)?).map(g2_result).map_err(failed)
        }
        Bls12_381_G2_Equal => {
            let [a, b] = arguments(args)?;
            backend.g2_equal(g2(a)?, g2(b)?).map(bool_result).map_err(failed)
        }
        Bls12_381_G2_Compress => {
            let [a] = arguments(args)?;
            backend.g2_compress(g2(a)?).map(bytes_result).map_err(failed)
        }
        Bls12_381_G2_Uncompress => {
            let [b] = arguments(args)?;
            backend.g2_uncompress(bytes(b)?).map(g2_result).map_err(failed)
        }
        Bls12_381_G2_HashToGroup => {
            let [message, dst] = arguments(args)?;
            backend.g2_hash_to_group(bytes(message)?, bytes(dst)?).map(g2_result).map_err(failed)
        }

        Bls12_381_MillerLoop => {
            let [a, b] = arguments(args)?;
            backend
                .miller_loop(g1(a)?, g2(b)?)
                .map(|r| Value::con(Constant::Bls12_381MlResult(r)))
                .map_err(failed)
        }
        Bls12_381_MulMlResult => {
            let [a, b] = arguments(args)?;
            backend
                .mul_ml_result(ml_result(a)?, ml_result(b)?)
                .map(|r| Value::con(Constant::Bls12_381MlResult(r)))
                .map_err(failed)
        }
        Bls12_381_FinalVerify => {
            let [a, b] = arguments(args)?;
            backend.final_verify(ml_result(a)?, ml_result(b)?).map(bool_result).map_err(failed)
        }
        _ => Err(BuiltinFailure::UnsupportedPrimitive(fun)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use test_case::test_case;

    #[test_case(DefaultFunction::Sha2_256, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")]
    #[test_case(DefaultFunction::Sha3_256, "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a")]
    #[test_case(DefaultFunction::Blake2b_224, "836cc68931c2e4e3e838602eca1902591d216837bafddfe6f0c8cb07")]
    #[test_case(DefaultFunction::Blake2b_256, "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8")]
    #[test_case(DefaultFunction::Keccak_256, "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")]
    #[test_case(DefaultFunction::Ripemd_160, "9c1185a5c5e9fc54612808977ee8f548b2258d31")]
    fn hashes_of_the_empty_string(fun: DefaultFunction, expected: &str) {
        assert_eq!(
            run(fun, vec![bs("")]),
            Ok(Constant::byte_string(hex::decode(expected).unwrap()))
        );
    }

    // RFC 8032, test 1
    const KEY: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
    const SIGNATURE: &str = "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b";

    #[test]
    fn ed25519_accepts_a_valid_signature() {
        assert_eq!(
            run(DefaultFunction::VerifyEd25519Signature, vec![bs(KEY), bs(""), bs(SIGNATURE)]),
            Ok(Constant::Bool(true))
        );
    }

    #[test]
    fn ed25519_rejects_a_different_message() {
        assert_eq!(
            run(DefaultFunction::VerifyEd25519Signature, vec![bs(KEY), bs("00"), bs(SIGNATURE)]),
            Ok(Constant::Bool(false))
        );
    }

    #[test]
    fn ed25519_checks_lengths() {
        assert_eq!(
            run(DefaultFunction::VerifyEd25519Signature, vec![bs("00"), bs(""), bs(SIGNATURE)]),
            Err(BuiltinFailure::InvalidLength {
                name: "ed25519 public key",
                expected: 32,
                actual: 1
            })
        );
        assert!(matches!(
            run(DefaultFunction::VerifyEd25519Signature, vec![bs(KEY), bs(""), bs("00")]),
            Err(BuiltinFailure::InvalidLength { expected: 64, .. })
        ));
    }
}
