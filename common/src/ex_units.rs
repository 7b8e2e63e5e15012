//! Execution units: the two-dimensional budget currency.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use crate::costing_integer::CostingInteger;

/// Memory units and CPU steps, forming an additive monoid.
///
/// Arithmetic saturates through [`CostingInteger`], so accumulating spend
/// can never wrap.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ExUnits {
    /// Memory units
    pub mem: i64,
    /// CPU steps
    pub steps: i64,
}

impl ExUnits {
    pub const ZERO: Self = Self { mem: 0, steps: 0 };

    pub const fn new(mem: i64, steps: i64) -> Self {
        Self { mem, steps }
    }

    pub fn from_costing(mem: CostingInteger, steps: CostingInteger) -> Self {
        Self {
            mem: mem.value(),
            steps: steps.value(),
        }
    }

    /// True when either dimension has gone below zero
    pub fn is_negative(&self) -> bool {
        self.mem < 0 || self.steps < 0
    }

    /// Multiply both dimensions by `n`, saturating
    pub fn times(self, n: i64) -> Self {
        Self {
            mem: self.mem.saturating_mul(n),
            steps: self.steps.saturating_mul(n),
        }
    }
}

impl Add for ExUnits {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            mem: self.mem.saturating_add(rhs.mem),
            steps: self.steps.saturating_add(rhs.steps),
        }
    }
}

impl AddAssign for ExUnits {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for ExUnits {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            mem: self.mem.saturating_sub(rhs.mem),
            steps: self.steps.saturating_sub(rhs.steps),
        }
    }
}

impl Sum for ExUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for ExUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ mem: {}, steps: {} }}", self.mem, self.steps)
    }
}
