//! Multi-asset values: a two-level sorted map from currency symbol to token
//! name to signed quantity.
//!
//! The canonical form holds no zero quantities and no empty token maps, and
//! every key is at most [`MAX_KEY_LENGTH`] bytes long. Each operation returns a
//! fresh value that preserves this form.

use std::collections::BTreeMap;

use dashu_int::IBig;
use serde_with::{hex::Hex, serde_as, DisplayFromStr};
use thiserror::Error;

use crate::data::PlutusData;

/// Longest permitted currency symbol or token name, in bytes
pub const MAX_KEY_LENGTH: usize = 32;

type TokenMap = BTreeMap<Vec<u8>, i128>;

/// Errors from value construction or arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuiltinValueError {
    #[error("currency symbol is {0} bytes long, at most 32 are allowed")]
    CurrencyTooLong(usize),

    #[error("token name is {0} bytes long, at most 32 are allowed")]
    TokenTooLong(usize),

    #[error("quantity {0} does not fit in a signed 128-bit integer")]
    QuantityOutOfRange(IBig),

    #[error("duplicate key #{} in value encoding", hex::encode(.0))]
    DuplicateKey(Vec<u8>),

    #[error("malformed value encoding: {0}")]
    Malformed(&'static str),
}

/// A canonical multi-asset value
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(try_from = "ValueEntries", into = "ValueEntries")]
pub struct BuiltinValue {
    entries: BTreeMap<Vec<u8>, TokenMap>,
}

/// Unchecked serialized form, validated on the way in
#[serde_as]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
struct ValueEntries(
    #[serde_as(as = "BTreeMap<Hex, BTreeMap<Hex, DisplayFromStr>>")] BTreeMap<Vec<u8>, TokenMap>,
);

impl TryFrom<ValueEntries> for BuiltinValue {
    type Error = BuiltinValueError;

    fn try_from(raw: ValueEntries) -> Result<Self, Self::Error> {
        let mut value = BuiltinValue::empty();
        for (currency, tokens) in raw.0 {
            for (token, quantity) in tokens {
                value.set(currency.clone(), token, quantity)?;
            }
        }
        Ok(value)
    }
}

impl From<BuiltinValue> for ValueEntries {
    fn from(value: BuiltinValue) -> Self {
        ValueEntries(value.entries)
    }
}

fn check_keys(currency: &[u8], token: &[u8]) -> Result<(), BuiltinValueError> {
    if currency.len() > MAX_KEY_LENGTH {
        return Err(BuiltinValueError::CurrencyTooLong(currency.len()));
    }
    if token.len() > MAX_KEY_LENGTH {
        return Err(BuiltinValueError::TokenTooLong(token.len()));
    }
    Ok(())
}

fn to_quantity(amount: &IBig) -> Result<i128, BuiltinValueError> {
    i128::try_from(amount).map_err(|_| BuiltinValueError::QuantityOutOfRange(amount.clone()))
}

fn overflow(a: i128, b: i128) -> BuiltinValueError {
    BuiltinValueError::QuantityOutOfRange(IBig::from(a) + IBig::from(b))
}

/// Depth of a balanced binary tree holding `n` entries
fn tree_depth(n: usize) -> usize {
    (usize::BITS - n.leading_zeros()) as usize
}

impl BuiltinValue {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set a quantity in place, removing the entry when it is zero
    fn set(
        &mut self,
        currency: Vec<u8>,
        token: Vec<u8>,
        quantity: i128,
    ) -> Result<(), BuiltinValueError> {
        check_keys(&currency, &token)?;
        if quantity == 0 {
            if let Some(tokens) = self.entries.get_mut(&currency) {
                tokens.remove(&token);
                if tokens.is_empty() {
                    self.entries.remove(&currency);
                }
            }
        } else {
            self.entries.entry(currency).or_default().insert(token, quantity);
        }
        Ok(())
    }

    /// A copy of this value with the quantity of `(currency, token)` set to
    /// `amount`; a zero amount removes the entry.
    pub fn insert_coin(
        &self,
        currency: &[u8],
        token: &[u8],
        amount: &IBig,
    ) -> Result<Self, BuiltinValueError> {
        check_keys(currency, token)?;
        let quantity = to_quantity(amount)?;
        let mut result = self.clone();
        result.set(currency.to_vec(), token.to_vec(), quantity)?;
        Ok(result)
    }

    /// Quantity held for `(currency, token)`, zero when absent
    pub fn lookup_coin(&self, currency: &[u8], token: &[u8]) -> i128 {
        self.entries
            .get(currency)
            .and_then(|tokens| tokens.get(token))
            .copied()
            .unwrap_or(0)
    }

    /// Pointwise sum; entries that cancel out are dropped
    pub fn union(&self, other: &Self) -> Result<Self, BuiltinValueError> {
        let mut result = self.clone();
        for (currency, tokens) in &other.entries {
            for (token, quantity) in tokens {
                let current = result.lookup_coin(currency, token);
                let sum =
                    current.checked_add(*quantity).ok_or_else(|| overflow(current, *quantity))?;
                result.set(currency.clone(), token.clone(), sum)?;
            }
        }
        Ok(result)
    }

    /// True when every entry of `other` is covered by at least that quantity here
    pub fn contains(&self, other: &Self) -> bool {
        other
            .iter()
            .all(|(currency, token, quantity)| self.lookup_coin(currency, token) >= quantity)
    }

    /// Multiply every quantity by `scalar`
    pub fn scale(&self, scalar: &IBig) -> Result<Self, BuiltinValueError> {
        if *scalar == IBig::ZERO {
            return Ok(Self::empty());
        }
        let mut result = Self::empty();
        for (currency, token, quantity) in self.iter() {
            let product = IBig::from(quantity) * scalar;
            result.set(currency.to_vec(), token.to_vec(), to_quantity(&product)?)?;
        }
        Ok(result)
    }

    /// Iterate entries as `(currency, token, quantity)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8], i128)> + '_ {
        self.entries.iter().flat_map(|(currency, tokens)| {
            tokens
                .iter()
                .map(move |(token, quantity)| (currency.as_slice(), token.as_slice(), *quantity))
        })
    }

    /// Number of `(currency, token)` entries
    pub fn total_size(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Depth of the nested map structure: the depth of the outer map plus the
    /// depth of the largest inner map, each measured as a balanced tree.
    pub fn max_depth(&self) -> usize {
        let inner = self.entries.values().map(BTreeMap::len).max().unwrap_or(0);
        tree_depth(self.entries.len()) + tree_depth(inner)
    }

    /// Encode as `Map [(B currency, Map [(B token, I quantity)])]`
    pub fn to_data(&self) -> PlutusData {
        PlutusData::Map(
            self.entries
                .iter()
                .map(|(currency, tokens)| {
                    let inner = tokens
                        .iter()
                        .map(|(token, quantity)| {
                            (PlutusData::bytes(token.clone()), PlutusData::integer(*quantity))
                        })
                        .collect();
                    (PlutusData::bytes(currency.clone()), PlutusData::Map(inner))
                })
                .collect(),
        )
    }

    /// Decode the [`to_data`](Self::to_data) encoding. Zero quantities and
    /// empty inner maps are dropped; repeated keys are rejected.
    pub fn from_data(data: &PlutusData) -> Result<Self, BuiltinValueError> {
        let PlutusData::Map(outer) = data else {
            return Err(BuiltinValueError::Malformed("expected a map of currencies"));
        };
        let mut value = Self::empty();
        let mut seen_currencies = std::collections::BTreeSet::new();
        for (key, tokens) in outer {
            let PlutusData::ByteString(currency) = key else {
                return Err(BuiltinValueError::Malformed("currency symbol must be a byte string"));
            };
            let PlutusData::Map(tokens) = tokens else {
                return Err(BuiltinValueError::Malformed("expected a map of tokens"));
            };
            if !seen_currencies.insert(currency.as_slice()) {
                return Err(BuiltinValueError::DuplicateKey(currency.clone()));
            }
            let mut seen_tokens = std::collections::BTreeSet::new();
            for (key, amount) in tokens {
                let PlutusData::ByteString(token) = key else {
                    return Err(BuiltinValueError::Malformed("token name must be a byte string"));
                };
                let PlutusData::Integer(amount) = amount else {
                    return Err(BuiltinValueError::Malformed("quantity must be an integer"));
                };
                if !seen_tokens.insert(token.as_slice()) {
                    return Err(BuiltinValueError::DuplicateKey(token.clone()));
                }
                value.set(currency.clone(), token.clone(), to_quantity(amount)?)?;
            }
        }
        Ok(value)
    }

    /// Canonical-form check
    pub fn is_canonical(&self) -> bool {
        self.entries.iter().all(|(currency, tokens)| {
            currency.len() <= MAX_KEY_LENGTH
                && !tokens.is_empty()
                && tokens
                    .iter()
                    .all(|(token, quantity)| token.len() <= MAX_KEY_LENGTH && *quantity != 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use test_case::test_case;

    fn key(g: &mut Gen) -> Vec<u8> {
        // small alphabet so generated values share keys
        let len = usize::arbitrary(g) % 3;
        vec![u8::arbitrary(g) % 3; len]
    }

    impl Arbitrary for BuiltinValue {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut value = BuiltinValue::empty();
            for _ in 0..usize::arbitrary(g) % 8 {
                let amount = IBig::from(i64::arbitrary(g));
                value = value.insert_coin(&key(g), &key(g), &amount).unwrap();
            }
            value
        }
    }

    fn single(currency: &[u8], token: &[u8], amount: i128) -> BuiltinValue {
        BuiltinValue::empty()
            .insert_coin(currency, token, &IBig::from(amount))
            .unwrap()
    }

    #[test]
    fn insert_then_lookup() {
        let value = single(b"ada", b"", 5);
        assert_eq!(value.lookup_coin(b"ada", b""), 5);
        assert_eq!(value.lookup_coin(b"ada", b"x"), 0);
        assert_eq!(value.lookup_coin(b"btc", b""), 0);
    }

    #[test]
    fn inserting_zero_removes_the_entry() {
        let value = single(b"ada", b"", 5)
            .insert_coin(b"ada", b"", &IBig::ZERO)
            .unwrap();
        assert!(value.is_empty());
        assert!(value.is_canonical());
    }

    #[test]
    fn containment_compares_every_right_entry() {
        let left = single(b"a", b"t", 5);
        let right = left.union(&single(b"b", b"t", 1)).unwrap();
        assert!(!left.contains(&right));
        assert!(right.contains(&left));

        let owed = left.union(&single(b"b", b"t", -3)).unwrap();
        assert!(left.contains(&owed));
        let zeroed = single(b"b", b"t", 2)
            .insert_coin(b"b", b"t", &IBig::ZERO)
            .unwrap();
        assert!(BuiltinValue::empty().contains(&zeroed));
    }

    #[test_case(33, 0 ; "long currency")]
    #[test_case(0, 33 ; "long token")]
    fn key_lengths_are_bounded(currency: usize, token: usize) {
        let result =
            BuiltinValue::empty().insert_coin(&vec![1; currency], &vec![2; token], &IBig::ONE);
        assert!(matches!(
            result,
            Err(BuiltinValueError::CurrencyTooLong(33)) | Err(BuiltinValueError::TokenTooLong(33))
        ));
    }

    #[test]
    fn quantities_span_exactly_the_128_bit_range() {
        let max = IBig::from(i128::MAX);
        let min = IBig::from(i128::MIN);
        assert!(BuiltinValue::empty().insert_coin(b"a", b"b", &max).is_ok());
        assert!(BuiltinValue::empty().insert_coin(b"a", b"b", &min).is_ok());
        assert!(matches!(
            BuiltinValue::empty().insert_coin(b"a", b"b", &(max + IBig::ONE)),
            Err(BuiltinValueError::QuantityOutOfRange(_))
        ));
        assert!(matches!(
            BuiltinValue::empty().insert_coin(b"a", b"b", &(min - IBig::ONE)),
            Err(BuiltinValueError::QuantityOutOfRange(_))
        ));
    }

    #[test]
    fn union_overflow_is_an_error() {
        let a = single(b"a", b"b", i128::MAX);
        assert!(matches!(
            a.union(&single(b"a", b"b", 1)),
            Err(BuiltinValueError::QuantityOutOfRange(_))
        ));
    }

    #[test]
    fn union_drops_cancelled_entries() {
        let a = single(b"a", b"b", 7);
        let b = single(b"a", b"b", -7);
        assert!(a.union(&b).unwrap().is_empty());
    }

    #[test]
    fn scaling_edges() {
        let value = single(b"a", b"b", -1);
        assert!(value.scale(&IBig::ZERO).unwrap().is_empty());
        // -1 * 2^127 is exactly i128::MIN
        let scaled = value.scale(&(IBig::ONE << 127)).unwrap();
        assert_eq!(scaled.lookup_coin(b"a", b"b"), i128::MIN);
        assert!(single(b"a", b"b", 2).scale(&(IBig::ONE << 127)).is_err());
    }

    #[test]
    fn sizes_and_depth() {
        let value = single(b"a", b"x", 1)
            .union(&single(b"a", b"y", 1))
            .unwrap()
            .union(&single(b"a", b"z", 1))
            .unwrap()
            .union(&single(b"b", b"x", 1))
            .unwrap();
        assert_eq!(value.total_size(), 4);
        // outer map of 2 (depth 2), largest inner map of 3 (depth 2)
        assert_eq!(value.max_depth(), 4);
        assert_eq!(BuiltinValue::empty().max_depth(), 0);
    }

    #[test]
    fn from_data_rejects_duplicates_and_bad_shapes() {
        let dup = PlutusData::Map(vec![
            (PlutusData::bytes(b"a".to_vec()), PlutusData::Map(vec![])),
            (PlutusData::bytes(b"a".to_vec()), PlutusData::Map(vec![])),
        ]);
        assert_eq!(
            BuiltinValue::from_data(&dup),
            Err(BuiltinValueError::DuplicateKey(b"a".to_vec()))
        );
        assert!(matches!(
            BuiltinValue::from_data(&PlutusData::List(vec![])),
            Err(BuiltinValueError::Malformed(_))
        ));
    }

    #[test]
    fn from_data_normalises_zero_entries() {
        let data = PlutusData::Map(vec![(
            PlutusData::bytes(b"a".to_vec()),
            PlutusData::Map(vec![(PlutusData::bytes(b"t".to_vec()), PlutusData::integer(0))]),
        )]);
        assert_eq!(BuiltinValue::from_data(&data), Ok(BuiltinValue::empty()));
    }

    #[test]
    fn json_round_trip() -> Result<(), anyhow::Error> {
        let value = single(&[0xab], &[0x01, 0x02], -3);
        let json = serde_json::to_string(&value)?;
        assert_eq!(json, r#"{"ab":{"0102":"-3"}}"#);
        assert_eq!(serde_json::from_str::<BuiltinValue>(&json)?, value);
        assert!(serde_json::from_str::<BuiltinValue>(r#"{"ab":{"01":"0"}}"#)?.is_empty());
        Ok(())
    }

    #[quickcheck]
    fn union_is_commutative(a: BuiltinValue, b: BuiltinValue) -> bool {
        a.union(&b) == b.union(&a)
    }

    #[quickcheck]
    fn union_with_empty_is_identity(a: BuiltinValue) -> bool {
        a.union(&BuiltinValue::empty()) == Ok(a.clone())
    }

    #[quickcheck]
    fn contains_is_reflexive(a: BuiltinValue) -> bool {
        a.contains(&a)
    }

    #[quickcheck]
    fn data_encoding_round_trips(a: BuiltinValue) -> bool {
        BuiltinValue::from_data(&a.to_data()) == Ok(a.clone())
    }

    #[quickcheck]
    fn operations_preserve_canonical_form(a: BuiltinValue, b: BuiltinValue, k: i8) -> bool {
        a.is_canonical()
            && a.union(&b).map(|v| v.is_canonical()).unwrap_or(false)
            && a.scale(&IBig::from(k)).map(|v| v.is_canonical()).unwrap_or(false)
    }
}
