//! Loading cost models from the JSON documents published with each protocol
//! version (`builtinCostModel*.json` and `cekMachineCosts*.json`).

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;
use uplc_common::{CostingInteger, DefaultFunction, ExUnits};

use super::{
    BuiltinCostModel, CekMachineCosts, ConstantOrLinear, CostFunction, CostModelError, CostingFun,
    ExpMod, FiveArguments, FourArguments, Linear, LinearInTwo, OneArgument, Quadratic,
    QuadraticInTwo, SixArguments, Subtracted, ThreeArguments, TwoArguments, WithInteraction,
};

type C = CostingInteger;

#[derive(Debug, Deserialize)]
struct LinearJson {
    intercept: i64,
    slope: i64,
}

impl From<LinearJson> for Linear {
    fn from(l: LinearJson) -> Self {
        Linear::new(l.intercept, l.slope)
    }
}

#[derive(Debug, Deserialize)]
struct TwoSlopesJson {
    intercept: i64,
    slope1: i64,
    slope2: i64,
}

impl From<TwoSlopesJson> for LinearInTwo {
    fn from(l: TwoSlopesJson) -> Self {
        LinearInTwo {
            intercept: C::new(l.intercept),
            slope1: C::new(l.slope1),
            slope2: C::new(l.slope2),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubtractedJson {
    intercept: i64,
    slope: i64,
    minimum: i64,
}

#[derive(Debug, Deserialize)]
struct QuadraticJson {
    c0: i64,
    c1: i64,
    c2: i64,
}

impl From<QuadraticJson> for Quadratic {
    fn from(q: QuadraticJson) -> Self {
        Quadratic {
            c0: C::new(q.c0),
            c1: C::new(q.c1),
            c2: C::new(q.c2),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuadraticInTwoJson {
    #[serde(default)]
    minimum: i64,
    c00: i64,
    c10: i64,
    c01: i64,
    c20: i64,
    c11: i64,
    c02: i64,
}

#[derive(Debug, Deserialize)]
struct InteractionJson {
    c00: i64,
    c10: i64,
    c01: i64,
    c11: i64,
}

#[derive(Debug, Deserialize)]
struct ConstantOrLinearJson {
    constant: i64,
    intercept: i64,
    slope: i64,
}

#[derive(Debug, Deserialize)]
struct ConstantOrModelJson {
    constant: i64,
    model: Box<ShapeJson>,
}

#[derive(Debug, Deserialize)]
struct ExpModJson {
    #[serde(alias = "c00")]
    coefficient00: i64,
    #[serde(alias = "c11")]
    coefficient11: i64,
    #[serde(alias = "c12")]
    coefficient12: i64,
}

/// One cost shape as written in the document: `{"type": ..., "arguments": ...}`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "arguments", rename_all = "snake_case")]
enum ShapeJson {
    ConstantCost(i64),
    #[serde(alias = "linear_cost")]
    LinearInX(LinearJson),
    LinearInY(LinearJson),
    LinearInZ(LinearJson),
    LinearInU(LinearJson),
    LinearInXAndY(TwoSlopesJson),
    LinearInYAndZ(TwoSlopesJson),
    LinearInMaxYz(LinearJson),
    AddedSizes(LinearJson),
    SubtractedSizes(SubtractedJson),
    MultipliedSizes(LinearJson),
    MinSize(LinearJson),
    MaxSize(LinearJson),
    LinearOnDiagonal(ConstantOrLinearJson),
    ConstAboveDiagonal(ConstantOrModelJson),
    ConstBelowDiagonal(ConstantOrModelJson),
    ConstOffDiagonal(ConstantOrModelJson),
    QuadraticInX(QuadraticJson),
    QuadraticInY(QuadraticJson),
    QuadraticInZ(QuadraticJson),
    QuadraticInXAndY(QuadraticInTwoJson),
    WithInteractionInXAndY(InteractionJson),
    LiteralInYOrLinearInZ(LinearJson),
    ExpModCost(ExpModJson),
}

impl ShapeJson {
    fn name(&self) -> &'static str {
        match self {
            ShapeJson::ConstantCost(_) => "constant_cost",
            ShapeJson::LinearInX(_) => "linear_in_x",
            ShapeJson::LinearInY(_) => "linear_in_y",
            ShapeJson::LinearInZ(_) => "linear_in_z",
            ShapeJson::LinearInU(_) => "linear_in_u",
            ShapeJson::LinearInXAndY(_) => "linear_in_x_and_y",
            ShapeJson::LinearInYAndZ(_) => "linear_in_y_and_z",
            ShapeJson::LinearInMaxYz(_) => "linear_in_max_yz",
            ShapeJson::AddedSizes(_) => "added_sizes",
            ShapeJson::SubtractedSizes(_) => "subtracted_sizes",
            ShapeJson::MultipliedSizes(_) => "multiplied_sizes",
            ShapeJson::MinSize(_) => "min_size",
            ShapeJson::MaxSize(_) => "max_size",
            ShapeJson::LinearOnDiagonal(_) => "linear_on_diagonal",
            ShapeJson::ConstAboveDiagonal(_) => "const_above_diagonal",
            ShapeJson::ConstBelowDiagonal(_) => "const_below_diagonal",
            ShapeJson::ConstOffDiagonal(_) => "const_off_diagonal",
            ShapeJson::QuadraticInX(_) => "quadratic_in_x",
            ShapeJson::QuadraticInY(_) => "quadratic_in_y",
            ShapeJson::QuadraticInZ(_) => "quadratic_in_z",
            ShapeJson::QuadraticInXAndY(_) => "quadratic_in_x_and_y",
            ShapeJson::WithInteractionInXAndY(_) => "with_interaction_in_x_and_y",
            ShapeJson::LiteralInYOrLinearInZ(_) => "literal_in_y_or_linear_in_z",
            ShapeJson::ExpModCost(_) => "exp_mod_cost",
        }
    }

    fn unsupported(&self, arity: usize) -> CostModelError {
        CostModelError::UnsupportedShape {
            shape: self.name(),
            arity,
        }
    }

    fn into_one(self) -> Result<OneArgument, CostModelError> {
        Ok(match self {
            ShapeJson::ConstantCost(c) => OneArgument::ConstantCost(C::new(c)),
            ShapeJson::LinearInX(l) => OneArgument::LinearInX(l.into()),
            ShapeJson::QuadraticInX(q) => OneArgument::QuadraticInX(q.into()),
            other => return Err(other.unsupported(1)),
        })
    }

    fn into_two(self) -> Result<TwoArguments, CostModelError> {
        Ok(match self {
            ShapeJson::ConstantCost(c) => TwoArguments::ConstantCost(C::new(c)),
            ShapeJson::LinearInX(l) => TwoArguments::LinearInX(l.into()),
            ShapeJson::LinearInY(l) => TwoArguments::LinearInY(l.into()),
            ShapeJson::LinearInXAndY(l) => TwoArguments::LinearInXAndY(l.into()),
            ShapeJson::AddedSizes(l) => TwoArguments::AddedSizes(l.into()),
            ShapeJson::SubtractedSizes(s) => TwoArguments::SubtractedSizes(Subtracted {
                intercept: C::new(s.intercept),
                slope: C::new(s.slope),
                minimum: C::new(s.minimum),
            }),
            ShapeJson::MultipliedSizes(l) => TwoArguments::MultipliedSizes(l.into()),
            ShapeJson::MinSize(l) => TwoArguments::MinSize(l.into()),
            ShapeJson::MaxSize(l) => TwoArguments::MaxSize(l.into()),
            ShapeJson::LinearOnDiagonal(l) => TwoArguments::LinearOnDiagonal(ConstantOrLinear {
                constant: C::new(l.constant),
                intercept: C::new(l.intercept),
                slope: C::new(l.slope),
            }),
            ShapeJson::ConstAboveDiagonal(m) => TwoArguments::ConstAboveDiagonal {
                constant: C::new(m.constant),
                model: Box::new(m.model.into_two()?),
            },
            ShapeJson::ConstBelowDiagonal(m) => TwoArguments::ConstBelowDiagonal {
                constant: C::new(m.constant),
                model: Box::new(m.model.into_two()?),
            },
            ShapeJson::ConstOffDiagonal(m) => TwoArguments::ConstOffDiagonal {
                constant: C::new(m.constant),
                model: m.model.into_one()?,
            },
            ShapeJson::QuadraticInY(q) => TwoArguments::QuadraticInY(q.into()),
            ShapeJson::QuadraticInXAndY(q) => TwoArguments::QuadraticInXAndY(QuadraticInTwo {
                minimum: C::new(q.minimum),
                c00: C::new(q.c00),
                c10: C::new(q.c10),
                c01: C::new(q.c01),
                c20: C::new(q.c20),
                c11: C::new(q.c11),
                c02: C::new(q.c02),
            }),
            ShapeJson::WithInteractionInXAndY(w) => {
                TwoArguments::WithInteractionInXAndY(WithInteraction {
                    c00: C::new(w.c00),
                    c10: C::new(w.c10),
                    c01: C::new(w.c01),
                    c11: C::new(w.c11),
                })
            }
            other => return Err(other.unsupported(2)),
        })
    }

    fn into_three(self) -> Result<ThreeArguments, CostModelError> {
        Ok(match self {
            ShapeJson::ConstantCost(c) => ThreeArguments::ConstantCost(C::new(c)),
            ShapeJson::AddedSizes(l) => ThreeArguments::AddedSizes(l.into()),
            ShapeJson::LinearInX(l) => ThreeArguments::LinearInX(l.into()),
            ShapeJson::LinearInY(l) => ThreeArguments::LinearInY(l.into()),
            ShapeJson::LinearInZ(l) => ThreeArguments::LinearInZ(l.into()),
            ShapeJson::QuadraticInZ(q) => ThreeArguments::QuadraticInZ(q.into()),
            ShapeJson::LiteralInYOrLinearInZ(l) => ThreeArguments::LiteralInYOrLinearInZ(l.into()),
            ShapeJson::LinearInMaxYz(l) => ThreeArguments::LinearInMaxYZ(l.into()),
            ShapeJson::LinearInYAndZ(l) => ThreeArguments::LinearInYAndZ(l.into()),
            ShapeJson::ExpModCost(e) => ThreeArguments::ExpModCost(ExpMod {
                c00: C::new(e.coefficient00),
                c11: C::new(e.coefficient11),
                c12: C::new(e.coefficient12),
            }),
            other => return Err(other.unsupported(3)),
        })
    }

    fn into_function(self, arity: usize) -> Result<CostFunction, CostModelError> {
        Ok(match arity {
            1 => CostFunction::One(self.into_one()?),
            2 => CostFunction::Two(self.into_two()?),
            3 => CostFunction::Three(self.into_three()?),
            4 => CostFunction::Four(match self {
                ShapeJson::ConstantCost(c) => FourArguments::ConstantCost(C::new(c)),
                ShapeJson::LinearInU(l) => FourArguments::LinearInU(l.into()),
                other => return Err(other.unsupported(4)),
            }),
            5 => CostFunction::Five(match self {
                ShapeJson::ConstantCost(c) => FiveArguments::ConstantCost(C::new(c)),
                other => return Err(other.unsupported(5)),
            }),
            6 => CostFunction::Six(match self {
                ShapeJson::ConstantCost(c) => SixArguments::ConstantCost(C::new(c)),
                other => return Err(other.unsupported(6)),
            }),
            _ => return Err(self.unsupported(arity)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CostingJson {
    cpu: ShapeJson,
    memory: ShapeJson,
}

impl BuiltinCostModel {
    /// Parse a builtin cost model document. Entries naming builtins this
    /// evaluator does not know are skipped with a warning.
    pub fn from_json(json: &str) -> Result<Self, CostModelError> {
        let entries: BTreeMap<String, CostingJson> =
            serde_json::from_str(json).map_err(|e| CostModelError::Json(e.to_string()))?;

        let mut model = BuiltinCostModel::new();
        for (name, costing) in entries {
            let Ok(builtin) = DefaultFunction::from_str(&name) else {
                warn!("Skipping cost model entry for unknown builtin '{name}'");
                continue;
            };
            let arity = builtin.arity();
            let costing = CostingFun::new(
                costing.cpu.into_function(arity)?,
                costing.memory.into_function(arity)?,
            )?;
            model.insert(builtin, costing)?;
        }
        Ok(model)
    }
}

#[derive(Debug, Deserialize)]
struct ExUnitsJson {
    #[serde(rename = "exBudgetCPU")]
    cpu: i64,
    #[serde(rename = "exBudgetMemory")]
    memory: i64,
}

impl From<ExUnitsJson> for ExUnits {
    fn from(e: ExUnitsJson) -> Self {
        ExUnits::new(e.memory, e.cpu)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MachineCostsJson {
    cek_startup_cost: ExUnitsJson,
    cek_var_cost: ExUnitsJson,
    cek_const_cost: ExUnitsJson,
    cek_lam_cost: ExUnitsJson,
    cek_delay_cost: ExUnitsJson,
    cek_force_cost: ExUnitsJson,
    cek_apply_cost: ExUnitsJson,
    cek_builtin_cost: ExUnitsJson,
    cek_constr_cost: Option<ExUnitsJson>,
    cek_case_cost: Option<ExUnitsJson>,
}

impl CekMachineCosts {
    /// Parse a machine costs document. Documents predating `constr` and
    /// `case` fall back to the default charge for those steps.
    pub fn from_json(json: &str) -> Result<Self, CostModelError> {
        let doc: MachineCostsJson =
            serde_json::from_str(json).map_err(|e| CostModelError::Json(e.to_string()))?;
        let defaults = CekMachineCosts::default();
        Ok(CekMachineCosts {
            startup: doc.cek_startup_cost.into(),
            var: doc.cek_var_cost.into(),
            constant: doc.cek_const_cost.into(),
            lambda: doc.cek_lam_cost.into(),
            delay: doc.cek_delay_cost.into(),
            force: doc.cek_force_cost.into(),
            apply: doc.cek_apply_cost.into(),
            builtin: doc.cek_builtin_cost.into(),
            constr: doc.cek_constr_cost.map(Into::into).unwrap_or(defaults.constr),
            case: doc.cek_case_cost.map(Into::into).unwrap_or(defaults.case),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILTINS: &str = r#"{
        "addInteger": {
            "cpu": { "arguments": { "intercept": 100788, "slope": 420 }, "type": "max_size" },
            "memory": { "arguments": { "intercept": 1, "slope": 1 }, "type": "max_size" }
        },
        "divideInteger": {
            "cpu": {
                "arguments": {
                    "constant": 85848,
                    "model": {
                        "arguments": { "c00": 123203, "c01": 7305, "c02": -900, "c10": 1716,
                                       "c11": 549, "c20": 57, "minimum": 85848 },
                        "type": "quadratic_in_x_and_y"
                    }
                },
                "type": "const_above_diagonal"
            },
            "memory": { "arguments": { "intercept": 0, "minimum": 1, "slope": 1 }, "type": "subtracted_sizes" }
        },
        "ifThenElse": {
            "cpu": { "arguments": 76049, "type": "constant_cost" },
            "memory": { "arguments": 1, "type": "constant_cost" }
        },
        "expModInteger": {
            "cpu": { "arguments": { "coefficient00": 607153, "coefficient11": 231697, "coefficient12": 53144 },
                     "type": "exp_mod_cost" },
            "memory": { "arguments": { "intercept": 0, "slope": 1 }, "type": "linear_in_z" }
        },
        "serialiseData": {
            "cpu": { "arguments": { "intercept": 955506, "slope": 213312 }, "type": "linear_in_x" },
            "memory": { "arguments": { "intercept": 0, "slope": 2 }, "type": "linear_in_x" }
        }
    }"#;

    #[test]
    fn parses_builtin_document() -> Result<(), CostModelError> {
        let model = BuiltinCostModel::from_json(BUILTINS)?;
        assert_eq!(model.len(), 4);

        let add = model.get(DefaultFunction::AddInteger).unwrap();
        assert_eq!(add.cost(&[C::new(1), C::new(3)]), ExUnits::new(4, 100788 + 420 * 3));

        let divide = model.get(DefaultFunction::DivideInteger).unwrap();
        // dividend smaller than divisor: constant cpu, minimum memory
        assert_eq!(divide.cost(&[C::new(1), C::new(2)]), ExUnits::new(1, 85848));

        let ite = model.get(DefaultFunction::IfThenElse).unwrap();
        assert_eq!(ite.arity(), 3);
        assert_eq!(ite.cost(&[C::ONE, C::ONE, C::ONE]), ExUnits::new(1, 76049));
        Ok(())
    }

    #[test]
    fn rejects_shape_with_wrong_arity() {
        let doc = r#"{
            "sha2_256": {
                "cpu": { "arguments": { "intercept": 1, "slope": 1 }, "type": "linear_in_z" },
                "memory": { "arguments": 4, "type": "constant_cost" }
            }
        }"#;
        assert_eq!(
            BuiltinCostModel::from_json(doc).unwrap_err(),
            CostModelError::UnsupportedShape {
                shape: "linear_in_z",
                arity: 1
            }
        );
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            BuiltinCostModel::from_json("[1, 2]"),
            Err(CostModelError::Json(_))
        ));
        assert!(matches!(
            BuiltinCostModel::from_json(r#"{"sha2_256": {"cpu": {"type": "no_such_shape", "arguments": 1}, "memory": {"type": "constant_cost", "arguments": 1}}}"#),
            Err(CostModelError::Json(_))
        ));
    }

    #[test]
    fn parses_machine_costs() -> Result<(), CostModelError> {
        let doc = r#"{
            "cekStartupCost": { "exBudgetCPU": 100, "exBudgetMemory": 100 },
            "cekVarCost": { "exBudgetCPU": 16000, "exBudgetMemory": 100 },
            "cekConstCost": { "exBudgetCPU": 16000, "exBudgetMemory": 100 },
            "cekLamCost": { "exBudgetCPU": 16000, "exBudgetMemory": 100 },
            "cekDelayCost": { "exBudgetCPU": 16000, "exBudgetMemory": 100 },
            "cekForceCost": { "exBudgetCPU": 16000, "exBudgetMemory": 100 },
            "cekApplyCost": { "exBudgetCPU": 16000, "exBudgetMemory": 100 },
            "cekBuiltinCost": { "exBudgetCPU": 16000, "exBudgetMemory": 100 },
            "cekCaseCost": { "exBudgetCPU": 12000, "exBudgetMemory": 90 }
        }"#;
        let costs = CekMachineCosts::from_json(doc)?;
        assert_eq!(costs, CekMachineCosts {
            case: ExUnits::new(90, 12000),
            ..CekMachineCosts::default()
        });
        Ok(())
    }
}
