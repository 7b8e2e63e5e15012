//! Outcome of an evaluation.

use std::collections::BTreeMap;

use uplc_common::{ExUnits, Term};

use crate::budget::{ExBudgetCategory, RestrictingBudgetSpender, TallyingBudgetSpender};
use crate::cost_model::MachineParams;
use crate::error::MachineError;
use crate::logger::Log;
use crate::machine::CekMachine;

/// The result term or the error, with whatever budget, per-category costs
/// and logs were accumulated before evaluation stopped
#[derive(Debug, Clone)]
pub enum EvalResult {
    Success {
        term: Term,
        budget: ExUnits,
        costs: BTreeMap<ExBudgetCategory, ExUnits>,
        logs: Vec<String>,
    },
    Failure {
        error: MachineError,
        budget: ExUnits,
        costs: BTreeMap<ExBudgetCategory, ExUnits>,
        logs: Vec<String>,
    },
}

impl EvalResult {
    pub fn is_success(&self) -> bool {
        matches!(self, EvalResult::Success { .. })
    }

    /// Budget spent, including the charge that failed, if any
    pub fn budget(&self) -> ExUnits {
        match self {
            EvalResult::Success { budget, .. } | EvalResult::Failure { budget, .. } => *budget,
        }
    }

    pub fn costs(&self) -> &BTreeMap<ExBudgetCategory, ExUnits> {
        match self {
            EvalResult::Success { costs, .. } | EvalResult::Failure { costs, .. } => costs,
        }
    }

    pub fn logs(&self) -> &[String] {
        match self {
            EvalResult::Success { logs, .. } | EvalResult::Failure { logs, .. } => logs,
        }
    }

    pub fn term(&self) -> Option<&Term> {
        match self {
            EvalResult::Success { term, .. } => Some(term),
            EvalResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&MachineError> {
        match self {
            EvalResult::Success { .. } => None,
            EvalResult::Failure { error, .. } => Some(error),
        }
    }

    /// Drop the accounting and keep the outcome
    pub fn into_result(self) -> Result<Term, MachineError> {
        match self {
            EvalResult::Success { term, .. } => Ok(term),
            EvalResult::Failure { error, .. } => Err(error),
        }
    }
}

/// Evaluate `term` with the standard builtins under a budget ceiling,
/// tallying costs by category and collecting logs
pub fn evaluate_with_budget(params: &MachineParams, term: &Term, limit: ExUnits) -> EvalResult {
    let machine = CekMachine::standard(params.clone());
    let mut spender = TallyingBudgetSpender::new(RestrictingBudgetSpender::new(limit));
    let mut log = Log::new();
    machine.evaluate(term, &mut spender, &mut log)
}
