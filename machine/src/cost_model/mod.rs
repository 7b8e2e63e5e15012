//! Cost model: parametric cost shapes for builtins and per-step machine costs.
//!
//! A builtin's cost is a pair of functions (CPU and memory) from the abstract
//! sizes of its arguments to a [`CostingInteger`]. All arithmetic saturates.

pub mod json;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use uplc_common::{CostingInteger, DefaultFunction, ExUnits};

use crate::budget::StepKind;

type C = CostingInteger;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostModelError {
    #[error(
        "costing function for {builtin} takes {actual} arguments, the builtin takes {expected}"
    )]
    ArityMismatch {
        builtin: DefaultFunction,
        expected: usize,
        actual: usize,
    },

    #[error("cpu model takes {cpu} arguments but memory model takes {mem}")]
    MismatchedModels { cpu: usize, mem: usize },

    #[error("cost shape '{shape}' is not valid for {arity} arguments")]
    UnsupportedShape { shape: &'static str, arity: usize },

    #[error("invalid cost model document: {0}")]
    Json(String),
}

// ============================================================================
// Coefficient records
// ============================================================================

/// `intercept + slope * n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linear {
    pub intercept: C,
    pub slope: C,
}

impl Linear {
    pub fn new(intercept: i64, slope: i64) -> Self {
        Self {
            intercept: C::new(intercept),
            slope: C::new(slope),
        }
    }

    pub fn at(&self, n: C) -> C {
        self.intercept + self.slope * n
    }
}

/// `intercept + slope1 * a + slope2 * b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearInTwo {
    pub intercept: C,
    pub slope1: C,
    pub slope2: C,
}

impl LinearInTwo {
    pub fn at(&self, a: C, b: C) -> C {
        self.intercept + self.slope1 * a + self.slope2 * b
    }
}

/// `intercept + slope * max(minimum, x - y)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subtracted {
    pub intercept: C,
    pub slope: C,
    pub minimum: C,
}

/// `c0 + c1 * n + c2 * n²`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quadratic {
    pub c0: C,
    pub c1: C,
    pub c2: C,
}

impl Quadratic {
    pub fn at(&self, n: C) -> C {
        self.c0 + self.c1 * n + self.c2 * n * n
    }
}

/// `max(minimum, c00 + c10 x + c01 y + c20 x² + c11 xy + c02 y²)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadraticInTwo {
    pub minimum: C,
    pub c00: C,
    pub c10: C,
    pub c01: C,
    pub c20: C,
    pub c11: C,
    pub c02: C,
}

impl QuadraticInTwo {
    pub fn at(&self, x: C, y: C) -> C {
        let value = self.c00
            + self.c10 * x
            + self.c01 * y
            + self.c20 * x * x
            + self.c11 * x * y
            + self.c02 * y * y;
        value.max(self.minimum)
    }
}

/// `c00 + c10 x + c01 y + c11 xy`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithInteraction {
    pub c00: C,
    pub c10: C,
    pub c01: C,
    pub c11: C,
}

/// `intercept + slope * x` on the diagonal, `constant` elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantOrLinear {
    pub constant: C,
    pub intercept: C,
    pub slope: C,
}

/// Modular exponentiation: `c00 + c11 e m + c12 e m²`, half again when the
/// base is larger than the modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpMod {
    pub c00: C,
    pub c11: C,
    pub c12: C,
}

impl ExpMod {
    pub fn at(&self, base: C, exponent: C, modulus: C) -> C {
        let cost =
            self.c00 + self.c11 * exponent * modulus + self.c12 * exponent * modulus * modulus;
        if base > modulus {
            cost + cost.checked_div(C::new(2)).unwrap_or(C::ZERO)
        } else {
            cost
        }
    }
}

// ============================================================================
// Shapes by arity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneArgument {
    ConstantCost(C),
    LinearInX(Linear),
    QuadraticInX(Quadratic),
}

impl OneArgument {
    pub fn cost(&self, x: C) -> C {
        match self {
            OneArgument::ConstantCost(c) => *c,
            OneArgument::LinearInX(l) => l.at(x),
            OneArgument::QuadraticInX(q) => q.at(x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwoArguments {
    ConstantCost(C),
    LinearInX(Linear),
    LinearInY(Linear),
    LinearInXAndY(LinearInTwo),
    AddedSizes(Linear),
    SubtractedSizes(Subtracted),
    MultipliedSizes(Linear),
    MinSize(Linear),
    MaxSize(Linear),
    LinearOnDiagonal(ConstantOrLinear),
    /// `constant` when `x < y`, otherwise the inner model
    ConstAboveDiagonal { constant: C, model: Box<TwoArguments> },
    /// `constant` when `x > y`, otherwise the inner model
    ConstBelowDiagonal { constant: C, model: Box<TwoArguments> },
    /// `constant` when `x != y`, otherwise the inner model applied to `x`
    ConstOffDiagonal { constant: C, model: OneArgument },
    QuadraticInY(Quadratic),
    QuadraticInXAndY(QuadraticInTwo),
    WithInteractionInXAndY(WithInteraction),
}

impl TwoArguments {
    pub fn cost(&self, x: C, y: C) -> C {
        match self {
            TwoArguments::ConstantCost(c) => *c,
            TwoArguments::LinearInX(l) => l.at(x),
            TwoArguments::LinearInY(l) => l.at(y),
            TwoArguments::LinearInXAndY(l) => l.at(x, y),
            TwoArguments::AddedSizes(l) => l.at(x + y),
            TwoArguments::SubtractedSizes(s) => s.intercept + s.slope * (x - y).max(s.minimum),
            TwoArguments::MultipliedSizes(l) => l.at(x * y),
            TwoArguments::MinSize(l) => l.at(x.min(y)),
            TwoArguments::MaxSize(l) => l.at(x.max(y)),
            TwoArguments::LinearOnDiagonal(l) => {
                if x == y {
                    l.intercept + l.slope * x
                } else {
                    l.constant
                }
            }
            TwoArguments::ConstAboveDiagonal { constant, model } => {
                if x < y {
                    *constant
                } else {
                    model.cost(x, y)
                }
            }
            TwoArguments::ConstBelowDiagonal { constant, model } => {
                if x > y {
                    *constant
                } else {
                    model.cost(x, y)
                }
            }
            TwoArguments::ConstOffDiagonal { constant, model } => {
                if x != y {
                    *constant
                } else {
                    model.cost(x)
                }
            }
            TwoArguments::QuadraticInY(q) => q.at(y),
            TwoArguments::QuadraticInXAndY(q) => q.at(x, y),
            TwoArguments::WithInteractionInXAndY(w) => {
                w.c00 + w.c10 * x + w.c01 * y + w.c11 * x * y
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreeArguments {
    ConstantCost(C),
    AddedSizes(Linear),
    LinearInX(Linear),
    LinearInY(Linear),
    LinearInZ(Linear),
    QuadraticInZ(Quadratic),
    /// `y` itself when non-zero, otherwise linear in `z`
    LiteralInYOrLinearInZ(Linear),
    LinearInMaxYZ(Linear),
    LinearInYAndZ(LinearInTwo),
    ExpModCost(ExpMod),
}

impl ThreeArguments {
    pub fn cost(&self, x: C, y: C, z: C) -> C {
        match self {
            ThreeArguments::ConstantCost(c) => *c,
            ThreeArguments::AddedSizes(l) => l.at(x + y + z),
            ThreeArguments::LinearInX(l) => l.at(x),
            ThreeArguments::LinearInY(l) => l.at(y),
            ThreeArguments::LinearInZ(l) => l.at(z),
            ThreeArguments::QuadraticInZ(q) => q.at(z),
            ThreeArguments::LiteralInYOrLinearInZ(l) => {
                if y == C::ZERO {
                    l.at(z)
                } else {
                    y
                }
            }
            ThreeArguments::LinearInMaxYZ(l) => l.at(y.max(z)),
            ThreeArguments::LinearInYAndZ(l) => l.at(y, z),
            ThreeArguments::ExpModCost(e) => e.at(x, y, z),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FourArguments {
    ConstantCost(C),
    /// Linear in the fourth argument
    LinearInU(Linear),
}

impl FourArguments {
    pub fn cost(&self, _x: C, _y: C, _z: C, u: C) -> C {
        match self {
            FourArguments::ConstantCost(c) => *c,
            FourArguments::LinearInU(l) => l.at(u),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiveArguments {
    ConstantCost(C),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SixArguments {
    ConstantCost(C),
}

/// A single-dimension cost function of any supported arity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostFunction {
    One(OneArgument),
    Two(TwoArguments),
    Three(ThreeArguments),
    Four(FourArguments),
    Five(FiveArguments),
    Six(SixArguments),
}

impl CostFunction {
    /// A constant function of the given arity
    pub fn constant(arity: usize, cost: i64) -> Option<Self> {
        let c = C::new(cost);
        Some(match arity {
            1 => CostFunction::One(OneArgument::ConstantCost(c)),
            2 => CostFunction::Two(TwoArguments::ConstantCost(c)),
            3 => CostFunction::Three(ThreeArguments::ConstantCost(c)),
            4 => CostFunction::Four(FourArguments::ConstantCost(c)),
            5 => CostFunction::Five(FiveArguments::ConstantCost(c)),
            6 => CostFunction::Six(SixArguments::ConstantCost(c)),
            _ => return None,
        })
    }

    pub fn arity(&self) -> usize {
        match self {
            CostFunction::One(_) => 1,
            CostFunction::Two(_) => 2,
            CostFunction::Three(_) => 3,
            CostFunction::Four(_) => 4,
            CostFunction::Five(_) => 5,
            CostFunction::Six(_) => 6,
        }
    }

    /// Evaluate at the given argument sizes. A size list of the wrong length
    /// costs [`CostingInteger::MAX`].
    pub fn cost(&self, sizes: &[C]) -> C {
        match (self, sizes) {
            (CostFunction::One(f), [x]) => f.cost(*x),
            (CostFunction::Two(f), [x, y]) => f.cost(*x, *y),
            (CostFunction::Three(f), [x, y, z]) => f.cost(*x, *y, *z),
            (CostFunction::Four(f), [x, y, z, u]) => f.cost(*x, *y, *z, *u),
            (CostFunction::Five(FiveArguments::ConstantCost(c)), [_, _, _, _, _]) => *c,
            (CostFunction::Six(SixArguments::ConstantCost(c)), [_, _, _, _, _, _]) => *c,
            _ => C::MAX,
        }
    }
}

/// CPU and memory cost functions of one builtin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostingFun {
    cpu: CostFunction,
    mem: CostFunction,
}

impl CostingFun {
    pub fn new(cpu: CostFunction, mem: CostFunction) -> Result<Self, CostModelError> {
        if cpu.arity() != mem.arity() {
            return Err(CostModelError::MismatchedModels {
                cpu: cpu.arity(),
                mem: mem.arity(),
            });
        }
        Ok(Self { cpu, mem })
    }

    pub fn arity(&self) -> usize {
        self.cpu.arity()
    }

    pub fn cpu(&self) -> &CostFunction {
        &self.cpu
    }

    pub fn mem(&self) -> &CostFunction {
        &self.mem
    }

    pub fn cost(&self, sizes: &[C]) -> ExUnits {
        ExUnits::from_costing(self.mem.cost(sizes), self.cpu.cost(sizes))
    }
}

// ============================================================================
// Model tables
// ============================================================================

/// Costing functions for every builtin the evaluator may run
#[derive(Debug, Clone, Default)]
pub struct BuiltinCostModel {
    functions: HashMap<DefaultFunction, Arc<CostingFun>>,
}

impl BuiltinCostModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `costing` for `builtin`, checking the arities agree
    pub fn insert(
        &mut self,
        builtin: DefaultFunction,
        costing: CostingFun,
    ) -> Result<(), CostModelError> {
        if costing.arity() != builtin.arity() {
            return Err(CostModelError::ArityMismatch {
                builtin,
                expected: builtin.arity(),
                actual: costing.arity(),
            });
        }
        self.functions.insert(builtin, Arc::new(costing));
        Ok(())
    }

    pub fn get(&self, builtin: DefaultFunction) -> Option<&Arc<CostingFun>> {
        self.functions.get(&builtin)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Every builtin at a flat cost, for tests and tooling
    pub fn uniform(cost: ExUnits) -> Self {
        let mut model = Self::new();
        for fun in DefaultFunction::ALL {
            let arity = fun.arity();
            if let (Some(cpu), Some(mem)) = (
                CostFunction::constant(arity, cost.steps),
                CostFunction::constant(arity, cost.mem),
            ) {
                model.functions.insert(*fun, Arc::new(CostingFun { cpu, mem }));
            }
        }
        model
    }
}

/// Fixed charge per machine step kind, plus the one-off startup charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CekMachineCosts {
    pub startup: ExUnits,
    pub var: ExUnits,
    pub constant: ExUnits,
    pub lambda: ExUnits,
    pub delay: ExUnits,
    pub force: ExUnits,
    pub apply: ExUnits,
    pub builtin: ExUnits,
    pub constr: ExUnits,
    pub case: ExUnits,
}

const STEP_COST: ExUnits = ExUnits::new(100, 16000);

impl Default for CekMachineCosts {
    fn default() -> Self {
        Self {
            startup: ExUnits::new(100, 100),
            var: STEP_COST,
            constant: STEP_COST,
            lambda: STEP_COST,
            delay: STEP_COST,
            force: STEP_COST,
            apply: STEP_COST,
            builtin: STEP_COST,
            constr: STEP_COST,
            case: STEP_COST,
        }
    }
}

impl CekMachineCosts {
    pub fn step(&self, kind: StepKind) -> ExUnits {
        match kind {
            StepKind::Var => self.var,
            StepKind::Constant => self.constant,
            StepKind::Lambda => self.lambda,
            StepKind::Delay => self.delay,
            StepKind::Force => self.force,
            StepKind::Apply => self.apply,
            StepKind::Builtin => self.builtin,
            StepKind::Constr => self.constr,
            StepKind::Case => self.case,
        }
    }
}

/// Everything a machine needs to price an evaluation
#[derive(Debug, Clone, Default)]
pub struct MachineParams {
    pub machine_costs: CekMachineCosts,
    pub builtin_costs: Arc<BuiltinCostModel>,
}

impl MachineParams {
    pub fn new(machine_costs: CekMachineCosts, builtin_costs: BuiltinCostModel) -> Self {
        Self {
            machine_costs,
            builtin_costs: Arc::new(builtin_costs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn c(n: i64) -> C {
        C::new(n)
    }

    fn inner_linear() -> Box<TwoArguments> {
        Box::new(TwoArguments::LinearInX(Linear::new(10, 1)))
    }

    #[test_case(3, 5, 100 ; "x below y")]
    #[test_case(5, 5, 15 ; "on the diagonal")]
    #[test_case(7, 5, 17 ; "x above y")]
    fn const_above_diagonal(x: i64, y: i64, expected: i64) {
        let f = TwoArguments::ConstAboveDiagonal {
            constant: c(100),
            model: inner_linear(),
        };
        assert_eq!(f.cost(c(x), c(y)), c(expected));
    }

    #[test_case(3, 5, 13)]
    #[test_case(7, 5, 100)]
    fn const_below_diagonal(x: i64, y: i64, expected: i64) {
        let f = TwoArguments::ConstBelowDiagonal {
            constant: c(100),
            model: inner_linear(),
        };
        assert_eq!(f.cost(c(x), c(y)), c(expected));
    }

    #[test]
    fn diagonal_shapes() {
        let on = TwoArguments::LinearOnDiagonal(ConstantOrLinear {
            constant: c(1),
            intercept: c(2),
            slope: c(3),
        });
        assert_eq!(on.cost(c(4), c(4)), c(14));
        assert_eq!(on.cost(c(4), c(5)), c(1));
        let off = TwoArguments::ConstOffDiagonal {
            constant: c(9),
            model: OneArgument::LinearInX(Linear::new(0, 2)),
        };
        assert_eq!(off.cost(c(4), c(4)), c(8));
        assert_eq!(off.cost(c(4), c(1)), c(9));
    }

    #[test]
    fn subtracted_sizes_respects_minimum() {
        let f = TwoArguments::SubtractedSizes(Subtracted {
            intercept: c(10),
            slope: c(2),
            minimum: c(1),
        });
        assert_eq!(f.cost(c(10), c(3)), c(24));
        assert_eq!(f.cost(c(3), c(10)), c(12));
    }

    #[test]
    fn size_combinators() {
        let l = Linear::new(1, 2);
        assert_eq!(TwoArguments::AddedSizes(l).cost(c(3), c(4)), c(15));
        assert_eq!(TwoArguments::MultipliedSizes(l).cost(c(3), c(4)), c(25));
        assert_eq!(TwoArguments::MinSize(l).cost(c(3), c(4)), c(7));
        assert_eq!(TwoArguments::MaxSize(l).cost(c(3), c(4)), c(9));
        assert_eq!(TwoArguments::LinearInY(l).cost(c(3), c(4)), c(9));
    }

    #[test]
    fn quadratic_in_two_has_a_floor() {
        let q = QuadraticInTwo {
            minimum: c(50),
            c00: c(-100),
            c10: c(1),
            c01: c(1),
            c20: c(0),
            c11: c(1),
            c02: c(0),
        };
        assert_eq!(q.at(c(1), c(1)), c(50));
        assert_eq!(q.at(c(10), c(10)), c(50));
        assert_eq!(q.at(c(20), c(10)), c(130));
    }

    #[test]
    fn literal_in_y_or_linear_in_z() {
        let f = ThreeArguments::LiteralInYOrLinearInZ(Linear::new(5, 2));
        assert_eq!(f.cost(c(1), c(0), c(10)), c(25));
        assert_eq!(f.cost(c(1), c(7), c(10)), c(7));
    }

    #[test]
    fn exp_mod_penalises_large_bases() {
        let e = ExpMod {
            c00: c(100),
            c11: c(1),
            c12: c(1),
        };
        // 100 + 2*3 + 2*9 = 124
        assert_eq!(e.at(c(3), c(2), c(3)), c(124));
        assert_eq!(e.at(c(4), c(2), c(3)), c(186));
    }

    #[test]
    fn saturating_shapes_never_wrap() {
        let q = Quadratic {
            c0: c(0),
            c1: c(0),
            c2: c(i64::MAX),
        };
        assert_eq!(q.at(c(i64::MAX)), C::MAX);
    }

    #[test]
    fn wrong_size_count_is_unaffordable() {
        let f = CostFunction::constant(2, 5).unwrap();
        assert_eq!(f.cost(&[c(1), c(2)]), c(5));
        assert_eq!(f.cost(&[c(1)]), C::MAX);
    }

    #[test]
    fn model_insert_checks_arity() {
        let mut model = BuiltinCostModel::new();
        let costing = CostingFun::new(
            CostFunction::constant(1, 10).unwrap(),
            CostFunction::constant(1, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(
            model.insert(DefaultFunction::AddInteger, costing.clone()),
            Err(CostModelError::ArityMismatch {
                builtin: DefaultFunction::AddInteger,
                expected: 2,
                actual: 1
            })
        );
        assert!(model.insert(DefaultFunction::Sha2_256, costing).is_ok());
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn costing_fun_needs_matching_arities() {
        assert_eq!(
            CostingFun::new(
                CostFunction::constant(1, 1).unwrap(),
                CostFunction::constant(2, 1).unwrap()
            ),
            Err(CostModelError::MismatchedModels { cpu: 1, mem: 2 })
        );
    }

    #[test]
    fn uniform_model_covers_every_builtin() {
        let model = BuiltinCostModel::uniform(ExUnits::new(1, 2));
        assert_eq!(model.len(), DefaultFunction::ALL.len());
        let costing = model.get(DefaultFunction::ChooseData).unwrap();
        assert_eq!(costing.cost(&[c(0); 6]), ExUnits::new(1, 2));
    }
}
