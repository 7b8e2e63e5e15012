//! 'main' for the UPLC evaluator

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, File};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uplc_common::Term;
use uplc_machine::configuration::{
    environment, CONFIG_KEY_CASE_ON_CONSTANTS, CONFIG_KEY_COST_MODEL, CONFIG_KEY_MAX_CPU,
    CONFIG_KEY_MAX_MEM, CONFIG_KEY_TRACE_BUDGET,
};
use uplc_machine::{
    CekMachine, EvalResult, Log, MachineConfig, RestrictingBudgetSpender, TallyingBudgetSpender,
    TallyingBudgetSpenderLogger,
};

#[derive(Parser, Debug)]
#[command(name = "uplc-eval")]
#[command(about = "Evaluate a JSON-encoded Untyped Plutus Core term")]
struct Args {
    /// Term to evaluate, as JSON
    term: PathBuf,

    /// Configuration file, later files override earlier ones
    #[arg(short, long)]
    config: Vec<PathBuf>,

    /// Builtin cost model in builtinCostModel.json format
    #[arg(long)]
    cost_model: Option<String>,

    /// CPU ceiling
    #[arg(long)]
    max_cpu: Option<i64>,

    /// Memory ceiling
    #[arg(long)]
    max_mem: Option<i64>,

    /// Reject case expressions on constants
    #[arg(long)]
    no_case_on_constants: bool,

    /// Show the budget spent when each log line was emitted
    #[arg(long)]
    trace_budget: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let mut builder = Config::builder();
    for path in &args.config {
        builder = builder.add_source(File::from(path.as_path()));
    }
    let config = builder
        .add_source(environment())
        .set_override_option(CONFIG_KEY_COST_MODEL, args.cost_model.clone())?
        .set_override_option(CONFIG_KEY_MAX_CPU, args.max_cpu)?
        .set_override_option(CONFIG_KEY_MAX_MEM, args.max_mem)?
        .set_override_option(
            CONFIG_KEY_CASE_ON_CONSTANTS,
            args.no_case_on_constants.then_some(false),
        )?
        .set_override_option(CONFIG_KEY_TRACE_BUDGET, args.trace_budget.then_some(true))?
        .build()
        .context("building configuration")?;

    let machine_config = MachineConfig::from_config(&config);
    let params = machine_config.load_params()?;
    let machine =
        CekMachine::standard(params).with_case_on_constants(machine_config.case_on_constants);

    let json = std::fs::read_to_string(&args.term)
        .with_context(|| format!("reading term from {}", args.term.display()))?;
    let term: Term = serde_json::from_str(&json)
        .with_context(|| format!("parsing term in {}", args.term.display()))?;
    info!("Evaluating {} with limit {}", args.term.display(), machine_config.budget);

    let limit = RestrictingBudgetSpender::new(machine_config.budget);
    let result = if machine_config.trace_budget {
        let mut instrumentation = TallyingBudgetSpenderLogger::new(limit);
        let result = machine.evaluate_instrumented(&term, &mut instrumentation);
        for (line, spent) in instrumentation.logs_with_budget() {
            println!("log {spent}: {line}");
        }
        result
    } else {
        let mut spender = TallyingBudgetSpender::new(limit);
        let result = machine.evaluate(&term, &mut spender, &mut Log::new());
        for line in result.logs() {
            println!("log: {line}");
        }
        result
    };

    report(result)
}

fn report(result: EvalResult) -> Result<()> {
    println!("budget: {}", result.budget());
    for (category, cost) in result.costs() {
        println!("  {category}: {cost}");
    }
    match result {
        EvalResult::Success { term, .. } => {
            println!("result: {term}");
            Ok(())
        }
        EvalResult::Failure { error, .. } => bail!("evaluation failed: {error}"),
    }
}
