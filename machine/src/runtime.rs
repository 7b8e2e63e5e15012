//! Partially applied builtins, their costing and the resolver that supplies
//! both the costing function and the implementation of each builtin.

use std::sync::Arc;

use uplc_common::memory_usage::{byte_count_as_words, literal_usage};
use uplc_common::{Constant, CostingInteger, DefaultFunction, ExUnits, MemoryUsage, Term};

use crate::builtins;
use crate::cost_model::{BuiltinCostModel, CostingFun, MachineParams};
use crate::error::BuiltinFailure;
use crate::logger::Logger;
use crate::primitives::ExternalPrimitives;
use crate::value::Value;

/// A builtin together with the forces and arguments it has received so far
#[derive(Debug, Clone)]
pub struct BuiltinRuntime {
    fun: DefaultFunction,
    costing: Arc<CostingFun>,
    forces: usize,
    args: Vec<Value>,
}

impl BuiltinRuntime {
    pub fn new(fun: DefaultFunction, costing: Arc<CostingFun>) -> Self {
        Self {
            fun,
            costing,
            forces: 0,
            args: Vec::with_capacity(fun.arity()),
        }
    }

    pub fn fun(&self) -> DefaultFunction {
        self.fun
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Still waiting for a type instantiation
    pub fn needs_force(&self) -> bool {
        self.forces < self.fun.force_count()
    }

    /// All forces and all term arguments received
    pub fn is_saturated(&self) -> bool {
        !self.needs_force() && self.args.len() == self.fun.arity()
    }

    pub fn force(mut self) -> Self {
        self.forces += 1;
        self
    }

    pub fn push(mut self, arg: Value) -> Self {
        self.args.push(arg);
        self
    }

    /// Cost of running the builtin on the arguments received
    pub fn cost(&self) -> ExUnits {
        self.costing.cost(&argument_sizes(self.fun, &self.args))
    }

    /// The builtin applied to what it has received so far, as a term
    pub fn discharge(&self) -> Term {
        crate::value::discharge_builtin(self)
    }

    /// The builtin with its forces, before any argument is applied
    pub(crate) fn head(&self) -> Term {
        (0..self.forces).fold(Term::Builtin(self.fun), |t, _| Term::force(t))
    }
}

/// Sizes of builtin arguments as the cost model sees them. Most arguments
/// are measured by memory usage; a few are measured by the integer they
/// carry, the length of a list or the depth of a value.
pub fn argument_sizes(fun: DefaultFunction, args: &[Value]) -> Vec<CostingInteger> {
    args.iter()
        .enumerate()
        .map(|(position, arg)| {
            special_size(fun, position, arg).unwrap_or_else(|| arg.memory_usage())
        })
        .collect()
}

fn special_size(fun: DefaultFunction, position: usize, arg: &Value) -> Option<CostingInteger> {
    use DefaultFunction::*;
    let constant = arg.as_constant()?;
    match (fun, position, constant) {
        (IntegerToByteString, 1, Constant::Integer(width)) => Some(byte_count_as_words(width)),
        (ReplicateByte, 0, Constant::Integer(count)) => Some(byte_count_as_words(count)),
        (ShiftByteString | RotateByteString, 1, Constant::Integer(bits)) => {
            Some(literal_usage(bits))
        }
        (DropList, 0, Constant::Integer(count)) => Some(literal_usage(count)),
        (WriteBits, 1, Constant::ProtoList(_, indices)) => {
            Some(CostingInteger::from(indices.len()))
        }
        (InsertCoin, 3, Constant::Value(value)) | (LookupCoin, 2, Constant::Value(value)) => {
            Some(CostingInteger::from(value.max_depth()))
        }
        _ => None,
    }
}

/// Supplies builtins to the machine
pub trait BuiltinResolver {
    /// A fresh runtime for `fun`, or `None` when it cannot be evaluated here
    fn resolve(&self, fun: DefaultFunction) -> Option<BuiltinRuntime>;

    /// Run a saturated builtin
    fn call(
        &self,
        fun: DefaultFunction,
        args: &[Value],
        logger: &mut dyn Logger,
    ) -> Result<Value, BuiltinFailure>;
}

/// The builtins implemented in this crate, priced by a [`BuiltinCostModel`].
/// BLS12-381 and secp256k1 builtins are available only with an
/// [`ExternalPrimitives`] backend.
#[derive(Clone)]
pub struct StandardBuiltins {
    costs: Arc<BuiltinCostModel>,
    primitives: Option<Arc<dyn ExternalPrimitives>>,
}

impl StandardBuiltins {
    pub fn new(params: &MachineParams) -> Self {
        Self {
            costs: params.builtin_costs.clone(),
            primitives: None,
        }
    }

    pub fn with_primitives(mut self, primitives: Arc<dyn ExternalPrimitives>) -> Self {
        self.primitives = Some(primitives);
        self
    }
}

impl BuiltinResolver for StandardBuiltins {
    fn resolve(&self, fun: DefaultFunction) -> Option<BuiltinRuntime> {
        if builtins::needs_external_primitives(fun) && self.primitives.is_none() {
            return None;
        }
        let costing = self.costs.get(fun)?;
        Some(BuiltinRuntime::new(fun, costing.clone()))
    }

    fn call(
        &self,
        fun: DefaultFunction,
        args: &[Value],
        logger: &mut dyn Logger,
    ) -> Result<Value, BuiltinFailure> {
        builtins::call(fun, args, self.primitives.as_deref(), logger)
    }
}
