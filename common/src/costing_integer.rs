//! Saturating integer arithmetic for cost computations.
//!
//! Every cost function computes with [`CostingInteger`], so a pathological
//! argument size can only ever push a cost to the representable bound, never
//! wrap it around into a small (or negative) figure.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

/// A 64-bit integer whose arithmetic clamps to `[i64::MIN, i64::MAX]`.
///
/// Ordering, `min` and `max` are those of the clamped value.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct CostingInteger(i64);

impl CostingInteger {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);
    pub const MAX: Self = Self(i64::MAX);
    pub const MIN: Self = Self(i64::MIN);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    pub fn sat_plus(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn sat_minus(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Saturates with the sign of the true product, so `MIN * -1` is `MAX`.
    pub fn sat_mul(self, rhs: Self) -> Self {
        Self(self.0.saturating_mul(rhs.0))
    }

    /// Truncating division; `None` when dividing by zero.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            None
        } else {
            Some(Self(self.0.saturating_div(rhs.0)))
        }
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for CostingInteger {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.sat_plus(rhs)
    }
}

impl Sub for CostingInteger {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.sat_minus(rhs)
    }
}

impl Mul for CostingInteger {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.sat_mul(rhs)
    }
}

impl Sum for CostingInteger {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for CostingInteger {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<CostingInteger> for i64 {
    fn from(value: CostingInteger) -> Self {
        value.0
    }
}

impl From<usize> for CostingInteger {
    fn from(value: usize) -> Self {
        Self(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u64> for CostingInteger {
    fn from(value: u64) -> Self {
        Self(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for CostingInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
