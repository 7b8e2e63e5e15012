//! Errors raised during evaluation.
//!
//! Three families: structural errors in the program, explicit failure
//! (the `error` term or a failing builtin) and budget exhaustion. Most
//! variants carry the environment in force when the failure happened.

use dashu_int::IBig;
use thiserror::Error;
use uplc_common::{BuiltinValueError, DefaultFunction, ExUnits, Term, Type};

use crate::budget::ExBudgetCategory;
use crate::value::Env;

/// A failure inside a builtin's implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuiltinFailure {
    #[error("expected {expected} argument, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    #[error("expected {expected} arguments, got {actual}")]
    WrongArgumentCount { expected: usize, actual: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: IBig, length: usize },

    #[error("{0} is not a byte value")]
    ByteOutOfRange(IBig),

    #[error("byte string is not valid UTF-8")]
    InvalidUtf8,

    #[error("{0} of an empty list")]
    EmptyList(&'static str),

    #[error("cannot cons {element} onto a list of {list}")]
    ListElementMismatch { element: Type, list: Type },

    #[error("expected {expected} data, got {actual} data")]
    UnexpectedData {
        expected: &'static str,
        actual: &'static str,
    },

    #[error(transparent)]
    Value(#[from] BuiltinValueError),

    #[error("modulus must be positive, got {0}")]
    NonPositiveModulus(IBig),

    #[error("{base} has no inverse modulo {modulus}")]
    NotInvertible { base: IBig, modulus: IBig },

    #[error("{0}")]
    IntegerConversion(String),

    #[error("{name} must be {expected} bytes long, got {actual}")]
    InvalidLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("no primitives backend for {0}")]
    UnsupportedPrimitive(DefaultFunction),

    #[error("primitive failed: {0}")]
    Primitive(String),
}

/// Evaluation failure
#[derive(Debug, Clone, Error)]
pub enum MachineError {
    #[error("free variable {name} (index {index}) in an environment of {} bindings", .env.len())]
    OpenTermEvaluated { name: String, index: usize, env: Env },

    #[error("attempted to apply a non-function {function} to {argument}")]
    NonFunctionalApplication {
        function: Term,
        argument: Term,
        env: Env,
    },

    #[error("attempted to force a non-polymorphic term {term}")]
    NonPolymorphicInstantiation { term: Term, env: Env },

    #[error("builtin {builtin} expected a term argument but was forced")]
    BuiltinTermArgumentExpected { builtin: DefaultFunction, env: Env },

    #[error("builtin {builtin} expected to be forced but received {argument}")]
    UnexpectedBuiltinTermArgument {
        builtin: DefaultFunction,
        argument: Term,
        env: Env,
    },

    #[error("builtin {builtin} is not available")]
    UnknownBuiltin { builtin: DefaultFunction, env: Env },

    #[error("the error term was evaluated")]
    EvaluationFailure { env: Env },

    #[error("no branch {tag} among {branches} case branches")]
    MissingCaseBranch {
        tag: IBig,
        branches: usize,
        env: Env,
    },

    #[error("case scrutinee {term} is not a constructor")]
    NonConstrScrutinized { term: Term, env: Env },

    #[error("case on bool {value} with {branches} branches")]
    CaseBoolBranchMissing {
        value: bool,
        branches: usize,
        env: Env,
    },

    #[error("case on unit needs exactly one branch, got {branches}")]
    CaseUnitBranchError { branches: usize, env: Env },

    #[error("case on a list (empty: {is_empty}) with {branches} branches")]
    CaseListBranchError {
        is_empty: bool,
        branches: usize,
        env: Env,
    },

    #[error("case on a pair needs exactly one branch, got {branches}")]
    CasePairBranchError { branches: usize, env: Env },

    #[error("case on data constructor {constructor} with {branches} branches")]
    CaseDataBranchError {
        constructor: usize,
        branches: usize,
        env: Env,
    },

    #[error("builtin {builtin} failed in {term}: {cause}")]
    BuiltinError {
        builtin: DefaultFunction,
        term: Term,
        cause: BuiltinFailure,
        env: Env,
    },

    #[error("out of budget paying for {category}, remaining {remaining}")]
    OutOfExBudgetError {
        category: ExBudgetCategory,
        remaining: ExUnits,
        env: Env,
    },
}

impl MachineError {
    /// Environment at the failure point
    pub fn env(&self) -> &Env {
        match self {
            MachineError::OpenTermEvaluated { env, .. }
            | MachineError::NonFunctionalApplication { env, .. }
            | MachineError::NonPolymorphicInstantiation { env, .. }
            | MachineError::BuiltinTermArgumentExpected { env, .. }
            | MachineError::UnexpectedBuiltinTermArgument { env, .. }
            | MachineError::UnknownBuiltin { env, .. }
            | MachineError::EvaluationFailure { env }
            | MachineError::MissingCaseBranch { env, .. }
            | MachineError::NonConstrScrutinized { env, .. }
            | MachineError::CaseBoolBranchMissing { env, .. }
            | MachineError::CaseUnitBranchError { env, .. }
            | MachineError::CaseListBranchError { env, .. }
            | MachineError::CasePairBranchError { env, .. }
            | MachineError::CaseDataBranchError { env, .. }
            | MachineError::BuiltinError { env, .. }
            | MachineError::OutOfExBudgetError { env, .. } => env,
        }
    }

    /// True for budget exhaustion, as opposed to a rejected script
    pub fn is_out_of_budget(&self) -> bool {
        matches!(self, MachineError::OutOfExBudgetError { .. })
    }
}
