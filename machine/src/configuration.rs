//! Machine settings read from a layered `config::Config`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use tracing::{info, warn};
use uplc_common::ExUnits;

use crate::cost_model::{BuiltinCostModel, CekMachineCosts, MachineParams};

pub const CONFIG_KEY_CASE_ON_CONSTANTS: &str = "machine.case_on_constants";
pub const CONFIG_KEY_MAX_CPU: &str = "machine.max_cpu";
pub const CONFIG_KEY_MAX_MEM: &str = "machine.max_mem";
pub const CONFIG_KEY_COST_MODEL: &str = "machine.cost_model";
pub const CONFIG_KEY_MACHINE_COSTS: &str = "machine.machine_costs";
pub const CONFIG_KEY_TRACE_BUDGET: &str = "machine.trace_budget";

/// Prefix of the environment variables that override configuration
pub const ENV_PREFIX: &str = "UPLC";

/// Per-transaction CPU ceiling on mainnet
pub const DEFAULT_MAX_CPU: i64 = 10_000_000_000;
/// Per-transaction memory ceiling on mainnet
pub const DEFAULT_MAX_MEM: i64 = 14_000_000;

/// Environment source mapping `UPLC_MACHINE__MAX_CPU` to `machine.max_cpu`
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    pub case_on_constants: bool,
    pub budget: ExUnits,
    pub cost_model: Option<PathBuf>,
    pub machine_costs: Option<PathBuf>,
    pub trace_budget: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            case_on_constants: true,
            budget: ExUnits::new(DEFAULT_MAX_MEM, DEFAULT_MAX_CPU),
            cost_model: None,
            machine_costs: None,
            trace_budget: false,
        }
    }
}

impl MachineConfig {
    /// Read every key, falling back to the default for any that is missing
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            case_on_constants: config
                .get_bool(CONFIG_KEY_CASE_ON_CONSTANTS)
                .unwrap_or(defaults.case_on_constants),
            budget: ExUnits::new(
                config.get_int(CONFIG_KEY_MAX_MEM).unwrap_or(DEFAULT_MAX_MEM),
                config.get_int(CONFIG_KEY_MAX_CPU).unwrap_or(DEFAULT_MAX_CPU),
            ),
            cost_model: config.get_string(CONFIG_KEY_COST_MODEL).ok().map(PathBuf::from),
            machine_costs: config.get_string(CONFIG_KEY_MACHINE_COSTS).ok().map(PathBuf::from),
            trace_budget: config.get_bool(CONFIG_KEY_TRACE_BUDGET).unwrap_or(defaults.trace_budget),
        }
    }

    /// Build machine parameters from the configured JSON files
    pub fn load_params(&self) -> Result<MachineParams> {
        let machine_costs = match &self.machine_costs {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading machine costs from {}", path.display()))?;
                info!("Loaded machine costs from {}", path.display());
                CekMachineCosts::from_json(&json)?
            }
            None => CekMachineCosts::default(),
        };

        let builtin_costs = match &self.cost_model {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| {
                        format!("reading builtin cost model from {}", path.display())
                    })?;
                let model = BuiltinCostModel::from_json(&json)?;
                info!("Loaded costing for {} builtins from {}", model.len(), path.display());
                model
            }
            None => {
                warn!("No builtin cost model configured, every builtin will be unavailable");
                BuiltinCostModel::new()
            }
        };

        Ok(MachineParams::new(machine_costs, builtin_costs))
    }
}
