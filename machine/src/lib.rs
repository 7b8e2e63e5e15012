//! CEK machine for Untyped Plutus Core: evaluation, the builtin runtime,
//! cost models and budget accounting.

pub mod budget;
pub mod builtins;
pub mod configuration;
pub mod cost_model;
pub mod error;
pub mod logger;
pub mod machine;
pub mod primitives;
pub mod result;
pub mod runtime;
pub mod value;

pub use budget::{
    BudgetSpender, CountingBudgetSpender, ExBudgetCategory, NoBudgetSpender,
    RestrictingBudgetSpender, StepKind, TallyingBudgetSpender, TallyingBudgetSpenderLogger,
};
pub use configuration::MachineConfig;
pub use cost_model::{
    BuiltinCostModel, CekMachineCosts, CostModelError, CostingFun, MachineParams,
};
pub use error::{BuiltinFailure, MachineError};
pub use logger::{Log, Logger, NoLogger};
pub use machine::{CekMachine, Instrumentation, SplitInstrumentation};
pub use primitives::ExternalPrimitives;
pub use result::{evaluate_with_budget, EvalResult};
pub use runtime::{BuiltinResolver, BuiltinRuntime, StandardBuiltins};
pub use value::{Env, Value};
