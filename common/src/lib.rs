//! Shared data model for UPLC evaluation: terms, constants, Data, multi-asset
//! values, the builtin catalog and saturating cost arithmetic.

pub mod bls;
pub mod builtin_value;
pub mod builtins;
pub mod constant;
pub mod costing_integer;
pub mod data;
pub mod ex_units;
pub mod memory_usage;
pub mod term;

pub use builtin_value::{BuiltinValue, BuiltinValueError};
pub use builtins::DefaultFunction;
pub use constant::{Constant, Type};
pub use costing_integer::CostingInteger;
pub use data::PlutusData;
pub use ex_units::ExUnits;
pub use memory_usage::MemoryUsage;
pub use term::{Name, Term};
