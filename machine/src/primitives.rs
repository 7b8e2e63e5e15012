//! Hook for cryptographic primitives supplied by the host: BLS12-381 group
//! operations and secp256k1 signature checks.
//!
//! Elements are opaque byte strings whose encoding belongs to the backend.
//! Errors are reported as strings and surface as builtin failures.

use dashu_int::IBig;
use uplc_common::bls::{G1Element, G2Element, MlResult};

pub type PrimitiveResult<T> = Result<T, String>;

pub trait ExternalPrimitives: Send + Sync {
    fn verify_ecdsa_secp256k1(
        &self,
        key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> PrimitiveResult<bool>;
    fn verify_schnorr_secp256k1(
        &self,
        key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> PrimitiveResult<bool>;

    fn g1_add(&self, a: &G1Element, b: &G1Element) -> PrimitiveResult<G1Element>;
    fn g1_neg(&self, a: &G1Element) -> PrimitiveResult<G1Element>;
    fn g1_scalar_mul(&self, scalar: &IBig, a: &G1Element) -> PrimitiveResult<G1Element>;
    fn g1_equal(&self, a: &G1Element, b: &G1Element) -> PrimitiveResult<bool>;
    fn g1_compress(&self, a: &G1Element) -> PrimitiveResult<Vec<u8>>;
    fn g1_uncompress(&self, bytes: &[u8]) -> PrimitiveResult<G1Element>;
    fn g1_hash_to_group(&self, message: &[u8], dst: &[u8]) -> PrimitiveResult<G1Element>;

    fn g2_add(&self, a: &G2Element, b: &G2Element) -> PrimitiveResult<G2Element>;
    fn g2_neg(&self, a: &G2Element) -> PrimitiveResult<G2Element>;
    fn g2_scalar_mul(&self, scalar: &IBig, a: &G2Element) -> PrimitiveResult<G2Element>;
    fn g2_equal(&self, a: &G2Element, b: &G2Element) -> PrimitiveResult<bool>;
    fn g2_compress(&self, a: &G2Element) -> PrimitiveResult<Vec<u8>>;
    fn g2_uncompress(&self, bytes: &[u8]) -> PrimitiveResult<G2Element>;
    fn g2_hash_to_group(&self, message: &[u8], dst: &[u8]) -> PrimitiveResult<G2Element>;

    fn miller_loop(&self, a: &G1Element, b: &G2Element) -> PrimitiveResult<MlResult>;
    fn mul_ml_result(&self, a: &MlResult, b: &MlResult) -> PrimitiveResult<MlResult>;
    fn final_verify(&self, a: &MlResult, b: &MlResult) -> PrimitiveResult<bool>;
}
