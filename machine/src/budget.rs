//! Budget categories and the spenders that account for (and police) every
//! charge the machine makes.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use uplc_common::{DefaultFunction, ExUnits};

use crate::error::MachineError;
use crate::logger::Logger;
use crate::value::Env;

/// Kinds of machine step, each with a fixed cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepKind {
    Constant,
    Var,
    Lambda,
    Apply,
    Delay,
    Force,
    Builtin,
    Constr,
    Case,
}

/// What a charge pays for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExBudgetCategory {
    Startup,
    Step(StepKind),
    BuiltinApp(DefaultFunction),
}

impl fmt::Display for ExBudgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExBudgetCategory::Startup => f.write_str("startup"),
            ExBudgetCategory::Step(kind) => write!(f, "{kind:?} step"),
            ExBudgetCategory::BuiltinApp(fun) => write!(f, "builtin {fun}"),
        }
    }
}

/// Receives every charge made during an evaluation
pub trait BudgetSpender {
    /// Record `cost` against `category`. An error aborts evaluation.
    fn spend_budget(
        &mut self,
        category: ExBudgetCategory,
        cost: ExUnits,
        env: &Env,
    ) -> Result<(), MachineError>;

    /// Total spent so far
    fn spent_budget(&self) -> ExUnits;

    /// Spend broken down by category, for spenders that keep one
    fn costs(&self) -> BTreeMap<ExBudgetCategory, ExUnits> {
        BTreeMap::new()
    }

    fn reset(&mut self);
}

/// Accepts every charge and records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBudgetSpender;

impl BudgetSpender for NoBudgetSpender {
    fn spend_budget(
        &mut self,
        _: ExBudgetCategory,
        _: ExUnits,
        _: &Env,
    ) -> Result<(), MachineError> {
        Ok(())
    }

    fn spent_budget(&self) -> ExUnits {
        ExUnits::ZERO
    }

    fn reset(&mut self) {}
}

/// Sums every charge, with no limit
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingBudgetSpender {
    spent: ExUnits,
}

impl CountingBudgetSpender {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BudgetSpender for CountingBudgetSpender {
    fn spend_budget(
        &mut self,
        _: ExBudgetCategory,
        cost: ExUnits,
        _: &Env,
    ) -> Result<(), MachineError> {
        self.spent += cost;
        Ok(())
    }

    fn spent_budget(&self) -> ExUnits {
        self.spent
    }

    fn reset(&mut self) {
        self.spent = ExUnits::ZERO;
    }
}

/// Enforces a ceiling: a charge that drives either dimension of the
/// remaining budget below zero fails. Landing exactly on zero is allowed.
#[derive(Debug, Clone, Copy)]
pub struct RestrictingBudgetSpender {
    limit: ExUnits,
    remaining: ExUnits,
}

impl RestrictingBudgetSpender {
    pub fn new(limit: ExUnits) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }

    pub fn remaining(&self) -> ExUnits {
        self.remaining
    }

    pub fn limit(&self) -> ExUnits {
        self.limit
    }
}

impl BudgetSpender for RestrictingBudgetSpender {
    fn spend_budget(
        &mut self,
        category: ExBudgetCategory,
        cost: ExUnits,
        env: &Env,
    ) -> Result<(), MachineError> {
        self.remaining = self.remaining - cost;
        if self.remaining.is_negative() {
            debug!("Budget exhausted charging {category}, remaining {}", self.remaining);
            return Err(MachineError::OutOfExBudgetError {
                category,
                remaining: self.remaining,
                env: env.clone(),
            });
        }
        Ok(())
    }

    fn spent_budget(&self) -> ExUnits {
        self.limit - self.remaining
    }

    fn reset(&mut self) {
        self.remaining = self.limit;
    }
}

/// Keeps a per-category tally while delegating every charge to `inner`.
/// A charge is tallied even when the delegate rejects it.
#[derive(Debug, Clone, Default)]
pub struct TallyingBudgetSpender<S> {
    inner: S,
    costs: BTreeMap<ExBudgetCategory, ExUnits>,
}

impl<S: BudgetSpender> TallyingBudgetSpender<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            costs: BTreeMap::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: BudgetSpender> BudgetSpender for TallyingBudgetSpender<S> {
    fn spend_budget(
        &mut self,
        category: ExBudgetCategory,
        cost: ExUnits,
        env: &Env,
    ) -> Result<(), MachineError> {
        *self.costs.entry(category).or_default() += cost;
        self.inner.spend_budget(category, cost, env)
    }

    fn spent_budget(&self) -> ExUnits {
        self.inner.spent_budget()
    }

    fn costs(&self) -> BTreeMap<ExBudgetCategory, ExUnits> {
        self.costs.clone()
    }

    fn reset(&mut self) {
        self.costs.clear();
        self.inner.reset();
    }
}

/// A tallying spender that is also the logger, so each log line can be
/// paired with the budget spent at the moment it was emitted.
#[derive(Debug, Clone, Default)]
pub struct TallyingBudgetSpenderLogger<S> {
    tally: TallyingBudgetSpender<S>,
    logs: Vec<(String, ExUnits)>,
}

impl<S: BudgetSpender> TallyingBudgetSpenderLogger<S> {
    pub fn new(inner: S) -> Self {
        Self {
            tally: TallyingBudgetSpender::new(inner),
            logs: Vec::new(),
        }
    }

    /// Log lines with the cumulative spend when each was emitted
    pub fn logs_with_budget(&self) -> &[(String, ExUnits)] {
        &self.logs
    }
}

impl<S: BudgetSpender> BudgetSpender for TallyingBudgetSpenderLogger<S> {
    fn spend_budget(
        &mut self,
        category: ExBudgetCategory,
        cost: ExUnits,
        env: &Env,
    ) -> Result<(), MachineError> {
        self.tally.spend_budget(category, cost, env)
    }

    fn spent_budget(&self) -> ExUnits {
        self.tally.spent_budget()
    }

    fn costs(&self) -> BTreeMap<ExBudgetCategory, ExUnits> {
        self.tally.costs()
    }

    fn reset(&mut self) {
        self.tally.reset();
        self.logs.clear();
    }
}

impl<S: BudgetSpender> Logger for TallyingBudgetSpenderLogger<S> {
    fn log(&mut self, message: String) {
        let spent = self.tally.spent_budget();
        self.logs.push((message, spent));
    }

    fn logs(&self) -> Vec<String> {
        self.logs.iter().map(|(line, _)| line.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: ExBudgetCategory = ExBudgetCategory::Step(StepKind::Var);

    #[test]
    fn restricting_allows_landing_on_zero() {
        let mut spender = RestrictingBudgetSpender::new(ExUnits::new(10, 100));
        let env = Env::new();
        assert!(spender.spend_budget(STEP, ExUnits::new(10, 100), &env).is_ok());
        assert_eq!(spender.remaining(), ExUnits::ZERO);
        assert_eq!(spender.spent_budget(), ExUnits::new(10, 100));
    }

    #[test]
    fn restricting_fails_on_either_dimension() {
        let env = Env::new();
        let mut spender = RestrictingBudgetSpender::new(ExUnits::new(10, 100));
        let err = spender.spend_budget(STEP, ExUnits::new(11, 0), &env).unwrap_err();
        assert!(matches!(
            err,
            MachineError::OutOfExBudgetError { category: STEP, remaining, .. } if remaining == ExUnits::new(-1, 100)
        ));

        let mut spender = RestrictingBudgetSpender::new(ExUnits::new(10, 100));
        assert!(spender.spend_budget(STEP, ExUnits::new(0, 101), &env).is_err());
    }

    #[test]
    fn restricting_reset_restores_limit() {
        let env = Env::new();
        let mut spender = RestrictingBudgetSpender::new(ExUnits::new(10, 10));
        spender.spend_budget(STEP, ExUnits::new(5, 5), &env).unwrap();
        spender.reset();
        assert_eq!(spender.remaining(), spender.limit());
    }

    #[test]
    fn tallying_groups_by_category() {
        let env = Env::new();
        let mut spender = TallyingBudgetSpender::new(CountingBudgetSpender::new());
        spender.spend_budget(STEP, ExUnits::new(1, 2), &env).unwrap();
        spender.spend_budget(STEP, ExUnits::new(1, 2), &env).unwrap();
        spender
            .spend_budget(ExBudgetCategory::Startup, ExUnits::new(5, 5), &env)
            .unwrap();
        let costs = spender.costs();
        assert_eq!(costs[&STEP], ExUnits::new(2, 4));
        assert_eq!(costs[&ExBudgetCategory::Startup], ExUnits::new(5, 5));
        assert_eq!(spender.spent_budget(), ExUnits::new(7, 9));
    }

    #[test]
    fn tallying_logger_pairs_logs_with_spend() {
        let env = Env::new();
        let mut spender = TallyingBudgetSpenderLogger::new(CountingBudgetSpender::new());
        spender.log("before".to_string());
        spender.spend_budget(STEP, ExUnits::new(3, 4), &env).unwrap();
        spender.log("after".to_string());
        assert_eq!(
            spender.logs_with_budget(),
            &[
                ("before".to_string(), ExUnits::ZERO),
                ("after".to_string(), ExUnits::new(3, 4))
            ]
        );
        assert_eq!(spender.logs(), vec!["before".to_string(), "after".to_string()]);
    }

    #[test]
    fn no_spender_records_nothing() {
        let mut spender = NoBudgetSpender;
        spender
            .spend_budget(STEP, ExUnits::new(i64::MAX, i64::MAX), &Env::new())
            .unwrap();
        assert_eq!(spender.spent_budget(), ExUnits::ZERO);
        assert!(spender.costs().is_empty());
    }
}
