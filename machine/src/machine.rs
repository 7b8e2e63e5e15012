//! The CEK machine.
//!
//! Evaluation is a loop over [`MachineState`]: `Compute` examines a term,
//! `Return` hands a value to the innermost frame of the continuation, and
//! `Done` carries the discharged result. Nothing recurses on the host stack,
//! so arbitrarily deep programs evaluate in constant stack space.

use std::mem;
use std::sync::Arc;

use dashu_int::IBig;
use tracing::{debug, trace};
use uplc_common::{Constant, ExUnits, PlutusData, Term, Type};

use crate::budget::{BudgetSpender, ExBudgetCategory, StepKind};
use crate::cost_model::MachineParams;
use crate::error::MachineError;
use crate::logger::Logger;
use crate::result::EvalResult;
use crate::runtime::{BuiltinResolver, BuiltinRuntime, StandardBuiltins};
use crate::value::{lookup, Binding, Env, Value};

/// A spender that also collects logs. Anything implementing both traits
/// qualifies, so a [`TallyingBudgetSpenderLogger`](crate::TallyingBudgetSpenderLogger)
/// can be handed to the machine as a single object.
pub trait Instrumentation: BudgetSpender + Logger {
    fn as_logger(&mut self) -> &mut dyn Logger;
}

impl<T: BudgetSpender + Logger> Instrumentation for T {
    fn as_logger(&mut self) -> &mut dyn Logger {
        self
    }
}

/// Pairs a separate spender and logger
pub struct SplitInstrumentation<'a> {
    spender: &'a mut dyn BudgetSpender,
    logger: &'a mut dyn Logger,
}

impl<'a> SplitInstrumentation<'a> {
    pub fn new(spender: &'a mut dyn BudgetSpender, logger: &'a mut dyn Logger) -> Self {
        Self { spender, logger }
    }
}

impl BudgetSpender for SplitInstrumentation<'_> {
    fn spend_budget(
        &mut self,
        category: ExBudgetCategory,
        cost: ExUnits,
        env: &Env,
    ) -> Result<(), MachineError> {
        self.spender.spend_budget(category, cost, env)
    }

    fn spent_budget(&self) -> ExUnits {
        self.spender.spent_budget()
    }

    fn costs(&self) -> std::collections::BTreeMap<ExBudgetCategory, ExUnits> {
        self.spender.costs()
    }

    fn reset(&mut self) {
        self.spender.reset();
    }
}

impl Logger for SplitInstrumentation<'_> {
    fn log(&mut self, message: String) {
        self.logger.log(message);
    }

    fn logs(&self) -> Vec<String> {
        self.logger.logs()
    }
}

/// What to do once the current value is ready
#[derive(Debug)]
enum Frame {
    /// `[v _]`: the function is evaluated, waiting for the argument
    AwaitArg(Value),
    /// `[_ t]`: evaluating the function, the argument term comes next
    AwaitFunTerm(Env, Arc<Term>),
    /// `[_ v]`: evaluating the function, the argument is already a value
    AwaitFunValue(Value),
    Force,
    /// Evaluating constructor fields left to right
    Constr {
        env: Env,
        tag: u64,
        fields: Arc<[Term]>,
        next: usize,
        values: Vec<Value>,
    },
    Cases {
        env: Env,
        branches: Arc<[Term]>,
    },
}

/// The continuation, innermost frame first
#[derive(Debug)]
enum Context {
    NoFrame,
    Frame(Frame, Box<Context>),
}

impl Context {
    fn push(self, frame: Frame) -> Self {
        Context::Frame(frame, Box::new(self))
    }

    /// Detach the innermost frame, leaving an empty shell behind
    fn pop(&mut self) -> Option<(Frame, Context)> {
        match self {
            Context::NoFrame => None,
            Context::Frame(frame, parent) => {
                let frame = mem::replace(frame, Frame::Force);
                let parent = mem::replace(parent.as_mut(), Context::NoFrame);
                Some((frame, parent))
            }
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let mut next = match self {
            Context::NoFrame => return,
            Context::Frame(_, parent) => mem::replace(parent.as_mut(), Context::NoFrame),
        };
        while let Context::Frame(_, parent) = &mut next {
            let parent = mem::replace(parent.as_mut(), Context::NoFrame);
            next = parent;
        }
    }
}

enum MachineState {
    Compute(Context, Env, Arc<Term>),
    Return(Context, Env, Value),
    Done(Term),
}

/// A CEK machine configured with costs and a builtin resolver. The machine
/// itself is immutable; each evaluation owns its own state.
#[derive(Clone)]
pub struct CekMachine<R = StandardBuiltins> {
    params: MachineParams,
    resolver: R,
    case_on_constants: bool,
}

impl CekMachine<StandardBuiltins> {
    /// A machine running the builtins implemented in this crate
    pub fn standard(params: MachineParams) -> Self {
        let resolver = StandardBuiltins::new(&params);
        Self::new(params, resolver)
    }
}

impl<R: BuiltinResolver> CekMachine<R> {
    pub fn new(params: MachineParams, resolver: R) -> Self {
        Self {
            params,
            resolver,
            case_on_constants: true,
        }
    }

    /// Allow `case` on integers, booleans, unit, lists, pairs and Data
    pub fn with_case_on_constants(mut self, enabled: bool) -> Self {
        self.case_on_constants = enabled;
        self
    }

    pub fn params(&self) -> &MachineParams {
        &self.params
    }

    /// Evaluate a closed term, charging `spender` and logging to `logger`
    pub fn evaluate(
        &self,
        term: &Term,
        spender: &mut dyn BudgetSpender,
        logger: &mut dyn Logger,
    ) -> EvalResult {
        let mut instrumentation = SplitInstrumentation::new(spender, logger);
        self.evaluate_instrumented(term, &mut instrumentation)
    }

    /// Evaluate with a single object acting as spender and logger
    pub fn evaluate_instrumented(
        &self,
        term: &Term,
        instrumentation: &mut dyn Instrumentation,
    ) -> EvalResult {
        let outcome = self.run(Arc::new(term.clone()), instrumentation);
        let budget = instrumentation.spent_budget();
        let costs = instrumentation.costs();
        let logs = instrumentation.logs();
        match outcome {
            Ok(term) => {
                debug!("Evaluation succeeded, spent {budget}");
                EvalResult::Success {
                    term,
                    budget,
                    costs,
                    logs,
                }
            }
            Err(error) => {
                debug!("Evaluation failed after spending {budget}: {error}");
                EvalResult::Failure {
                    error,
                    budget,
                    costs,
                    logs,
                }
            }
        }
    }

    fn run(
        &self,
        term: Arc<Term>,
        instrumentation: &mut dyn Instrumentation,
    ) -> Result<Term, MachineError> {
        debug!("Evaluation started, case on constants {}", self.case_on_constants);
        let env = Env::new();
        instrumentation.spend_budget(
            ExBudgetCategory::Startup,
            self.params.machine_costs.startup,
            &env,
        )?;

        let mut state = MachineState::Compute(Context::NoFrame, env, term);
        loop {
            state = match state {
                MachineState::Compute(ctx, env, term) => {
                    self.compute(ctx, env, &term, instrumentation)?
                }
                MachineState::Return(ctx, env, value) => {
                    self.return_value(ctx, env, value, instrumentation)?
                }
                MachineState::Done(term) => return Ok(term),
            };
        }
    }

    fn step(
        &self,
        kind: StepKind,
        env: &Env,
        instrumentation: &mut dyn Instrumentation,
    ) -> Result<(), MachineError> {
        instrumentation.spend_budget(
            ExBudgetCategory::Step(kind),
            self.params.machine_costs.step(kind),
            env,
        )
    }

    fn compute(
        &self,
        ctx: Context,
        env: Env,
        term: &Term,
        instrumentation: &mut dyn Instrumentation,
    ) -> Result<MachineState, MachineError> {
        Ok(match term {
            Term::Var(name) => {
                self.step(StepKind::Var, &env, instrumentation)?;
                match lookup(&env, name.index) {
                    Some(value) => {
                        let value = value.clone();
                        MachineState::Return(ctx, env, value)
                    }
                    None => {
                        return Err(MachineError::OpenTermEvaluated {
                            name: name.text.clone(),
                            index: name.index,
                            env,
                        })
                    }
                }
            }
            Term::LamAbs { name, body } => {
                self.step(StepKind::Lambda, &env, instrumentation)?;
                let value = Value::Lambda {
                    parameter: name.clone(),
                    body: body.clone(),
                    env: env.clone(),
                };
                MachineState::Return(ctx, env, value)
            }
            Term::Apply { function, argument } => {
                self.step(StepKind::Apply, &env, instrumentation)?;
                let ctx = ctx.push(Frame::AwaitFunTerm(env.clone(), argument.clone()));
                MachineState::Compute(ctx, env, function.clone())
            }
            Term::Delay(body) => {
                self.step(StepKind::Delay, &env, instrumentation)?;
                let value = Value::Delay(body.clone(), env.clone());
                MachineState::Return(ctx, env, value)
            }
            Term::Force(body) => {
                self.step(StepKind::Force, &env, instrumentation)?;
                MachineState::Compute(ctx.push(Frame::Force), env, body.clone())
            }
            Term::Const(constant) => {
                self.step(StepKind::Constant, &env, instrumentation)?;
                MachineState::Return(ctx, env, Value::Con(constant.clone()))
            }
            Term::Builtin(fun) => {
                self.step(StepKind::Builtin, &env, instrumentation)?;
                match self.resolver.resolve(*fun) {
                    Some(runtime) => MachineState::Return(ctx, env, Value::Builtin(runtime)),
                    None => return Err(MachineError::UnknownBuiltin { builtin: *fun, env }),
                }
            }
            Term::Error => return Err(MachineError::EvaluationFailure { env }),
            Term::Constr { tag, fields } => {
                self.step(StepKind::Constr, &env, instrumentation)?;
                match fields.first() {
                    None => MachineState::Return(ctx, env, Value::Constr(*tag, Vec::new())),
                    Some(first) => {
                        let first = Arc::new(first.clone());
                        let ctx = ctx.push(Frame::Constr {
                            env: env.clone(),
                            tag: *tag,
                            fields: fields.clone(),
                            next: 1,
                            values: Vec::with_capacity(fields.len()),
                        });
                        MachineState::Compute(ctx, env, first)
                    }
                }
            }
            Term::Case {
                scrutinee,
                branches,
            } => {
                self.step(StepKind::Case, &env, instrumentation)?;
                let ctx = ctx.push(Frame::Cases {
                    env: env.clone(),
                    branches: branches.clone(),
                });
                MachineState::Compute(ctx, env, scrutinee.clone())
            }
        })
    }

    fn return_value(
        &self,
        mut ctx: Context,
        env: Env,
        value: Value,
        instrumentation: &mut dyn Instrumentation,
    ) -> Result<MachineState, MachineError> {
        let Some((frame, ctx)) = ctx.pop() else {
            return Ok(MachineState::Done(value.discharge()));
        };
        match frame {
            Frame::AwaitFunTerm(arg_env, argument) => Ok(MachineState::Compute(
                ctx.push(Frame::AwaitArg(value)),
                arg_env,
                argument,
            )),
            Frame::AwaitArg(function) => self.apply(ctx, env, function, value, instrumentation),
            Frame::AwaitFunValue(argument) => {
                self.apply(ctx, env, value, argument, instrumentation)
            }
            Frame::Force => self.force(ctx, env, value, instrumentation),
            Frame::Constr {
                env: frame_env,
                tag,
                fields,
                next,
                mut values,
            } => {
                values.push(value);
                match fields.get(next) {
                    Some(field) => {
                        let field = Arc::new(field.clone());
                        let ctx = ctx.push(Frame::Constr {
                            env: frame_env.clone(),
                            tag,
                            fields,
                            next: next + 1,
                            values,
                        });
                        Ok(MachineState::Compute(ctx, frame_env, field))
                    }
                    None => Ok(MachineState::Return(ctx, frame_env, Value::Constr(tag, values))),
                }
            }
            Frame::Cases {
                env: frame_env,
                branches,
            } => self.case(ctx, frame_env, value, &branches),
        }
    }

    fn apply(
        &self,
        ctx: Context,
        env: Env,
        function: Value,
        argument: Value,
        instrumentation: &mut dyn Instrumentation,
    ) -> Result<MachineState, MachineError> {
        match function {
            Value::Lambda {
                parameter,
                body,
                env: mut closure,
            } => {
                closure.push_back(Binding {
                    name: parameter,
                    value: argument,
                });
                Ok(MachineState::Compute(ctx, closure, body))
            }
            Value::Builtin(runtime) if runtime.needs_force() => {
                Err(MachineError::UnexpectedBuiltinTermArgument {
                    builtin: runtime.fun(),
                    argument: argument.discharge(),
                    env,
                })
            }
            Value::Builtin(runtime) if runtime.args().len() < runtime.fun().arity() => {
                self.saturate(ctx, env, runtime.push(argument), instrumentation)
            }
            function => Err(MachineError::NonFunctionalApplication {
                function: function.discharge(),
                argument: argument.discharge(),
                env,
            }),
        }
    }

    fn force(
        &self,
        ctx: Context,
        env: Env,
        value: Value,
        instrumentation: &mut dyn Instrumentation,
    ) -> Result<MachineState, MachineError> {
        match value {
            Value::Delay(body, delay_env) => Ok(MachineState::Compute(ctx, delay_env, body)),
            Value::Builtin(runtime) if runtime.needs_force() => {
                self.saturate(ctx, env, runtime.force(), instrumentation)
            }
            Value::Builtin(runtime) => Err(MachineError::BuiltinTermArgumentExpected {
                builtin: runtime.fun(),
                env,
            }),
            value => Err(MachineError::NonPolymorphicInstantiation {
                term: value.discharge(),
                env,
            }),
        }
    }

    /// Run the builtin if it has everything it needs, else hand it back
    fn saturate(
        &self,
        ctx: Context,
        env: Env,
        runtime: BuiltinRuntime,
        instrumentation: &mut dyn Instrumentation,
    ) -> Result<MachineState, MachineError> {
        if !runtime.is_saturated() {
            return Ok(MachineState::Return(ctx, env, Value::Builtin(runtime)));
        }

        let fun = runtime.fun();
        instrumentation.spend_budget(ExBudgetCategory::BuiltinApp(fun), runtime.cost(), &env)?;
        trace!("Saturated {fun}");
        match self.resolver.call(fun, runtime.args(), instrumentation.as_logger()) {
            Ok(result) => Ok(MachineState::Return(ctx, env, result)),
            Err(cause) => Err(MachineError::BuiltinError {
                builtin: fun,
                term: runtime.discharge(),
                cause,
                env,
            }),
        }
    }

    fn case(
        &self,
        ctx: Context,
        env: Env,
        scrutinee: Value,
        branches: &[Term],
    ) -> Result<MachineState, MachineError> {
        let (index, args) = match scrutinee {
            Value::Constr(tag, fields) => {
                let index = usize::try_from(tag)
                    .ok()
                    .filter(|i| *i < branches.len())
                    .ok_or_else(|| MachineError::MissingCaseBranch {
                        tag: IBig::from(tag),
                        branches: branches.len(),
                        env: env.clone(),
                    })?;
                (index, fields)
            }
            Value::Con(constant) if self.case_on_constants => {
                case_on_constant(&constant, branches.len(), &env)?
            }
            other => {
                return Err(MachineError::NonConstrScrutinized {
                    term: other.discharge(),
                    env,
                })
            }
        };

        // The first argument must be applied first, so it goes on top
        let ctx = args
            .into_iter()
            .rev()
            .fold(ctx, |ctx, arg| ctx.push(Frame::AwaitFunValue(arg)));
        let branch = Arc::new(branches[index].clone());
        Ok(MachineState::Compute(ctx, env, branch))
    }
}

/// Branch index and arguments for a `case` over a constant
fn case_on_constant(
    constant: &Constant,
    branches: usize,
    env: &Env,
) -> Result<(usize, Vec<Value>), MachineError> {
    let env = || env.clone();
    match constant {
        Constant::Integer(i) => usize::try_from(i)
            .ok()
            .filter(|index| *index < branches)
            .map(|index| (index, Vec::new()))
            .ok_or_else(|| MachineError::MissingCaseBranch {
                tag: i.clone(),
                branches,
                env: env(),
            }),
        Constant::Bool(value) => {
            let index = usize::from(*value);
            if branches > 2 || index >= branches {
                return Err(MachineError::CaseBoolBranchMissing {
                    value: *value,
                    branches,
                    env: env(),
                });
            }
            Ok((index, Vec::new()))
        }
        Constant::Unit => {
            if branches != 1 {
                return Err(MachineError::CaseUnitBranchError { branches, env: env() });
            }
            Ok((0, Vec::new()))
        }
        Constant::ProtoPair(_, _, first, second) => {
            if branches != 1 {
                return Err(MachineError::CasePairBranchError { branches, env: env() });
            }
            let args = vec![
                Value::con(first.as_ref().clone()),
                Value::con(second.as_ref().clone()),
            ];
            Ok((0, args))
        }
        Constant::ProtoList(element, items) => {
            let fail = || MachineError::CaseListBranchError {
                is_empty: items.is_empty(),
                branches,
                env: env(),
            };
            if !(1..=2).contains(&branches) {
                return Err(fail());
            }
            match items.split_first() {
                Some((head, tail)) => {
                    let tail = Constant::ProtoList(element.clone(), tail.to_vec());
                    Ok((0, vec![Value::con(head.clone()), Value::con(tail)]))
                }
                None if branches == 2 => Ok((1, Vec::new())),
                None => Err(fail()),
            }
        }
        Constant::Data(data) => {
            let constructor = data.constructor_index();
            if branches > 5 || constructor >= branches {
                return Err(MachineError::CaseDataBranchError {
                    constructor,
                    branches,
                    env: env(),
                });
            }
            Ok((constructor, data_fields(data)))
        }
        _ => Err(MachineError::NonConstrScrutinized {
            term: Term::Const(Arc::new(constant.clone())),
            env: env(),
        }),
    }
}

/// Arguments a Data branch receives, in `Constr, Map, List, I, B` order
fn data_fields(data: &PlutusData) -> Vec<Value> {
    match data {
        PlutusData::Constr(tag, fields) => vec![
            Value::con(Constant::Integer(tag.clone())),
            Value::con(Constant::data_list(fields.clone())),
        ],
        PlutusData::Map(entries) => {
            let pairs = entries
                .iter()
                .map(|(k, v)| {
                    Constant::ProtoPair(
                        Type::Data,
                        Type::Data,
                        Box::new(Constant::Data(k.clone())),
                        Box::new(Constant::Data(v.clone())),
                    )
                })
                .collect();
            vec![Value::con(Constant::ProtoList(Type::pair(Type::Data, Type::Data), pairs))]
        }
        PlutusData::List(items) => vec![Value::con(Constant::data_list(items.clone()))],
        PlutusData::Integer(i) => vec![Value::con(Constant::Integer(i.clone()))],
        PlutusData::ByteString(b) => vec![Value::con(Constant::ByteString(b.clone()))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_a_deep_context_does_not_overflow() {
        let mut ctx = Context::NoFrame;
        for _ in 0..500_000 {
            ctx = ctx.push(Frame::Force);
        }
        drop(ctx);
    }

    #[test]
    fn pop_returns_the_innermost_frame() {
        let mut ctx = Context::NoFrame
            .push(Frame::Force)
            .push(Frame::AwaitFunValue(Value::con(Constant::Unit)));
        let (frame, mut parent) = ctx.pop().unwrap();
        assert!(matches!(frame, Frame::AwaitFunValue(_)));
        assert!(matches!(parent.pop(), Some((Frame::Force, Context::NoFrame))));
    }

    #[test]
    fn bool_case_bounds() {
        let env = Env::new();
        assert!(case_on_constant(&Constant::Bool(false), 1, &env).is_ok());
        assert!(matches!(
            case_on_constant(&Constant::Bool(true), 1, &env),
            Err(MachineError::CaseBoolBranchMissing { value: true, branches: 1, .. })
        ));
        assert!(case_on_constant(&Constant::Bool(true), 3, &env).is_err());
    }

    #[test]
    fn list_case_passes_head_and_tail() {
        let list = Constant::list(Type::Integer, vec![Constant::integer(1), Constant::integer(2)]);
        let (index, args) = case_on_constant(&list, 1, &Env::new()).unwrap();
        assert_eq!(index, 0);
        let args: Vec<_> = args.iter().filter_map(Value::as_constant).cloned().collect();
        assert_eq!(
            args,
            vec![Constant::integer(1), Constant::list(Type::Integer, vec![Constant::integer(2)])]
        );
    }

    #[test]
    fn empty_list_case_needs_a_nil_branch() {
        let empty = Constant::list(Type::Integer, vec![]);
        assert!(matches!(
            case_on_constant(&empty, 1, &Env::new()),
            Err(MachineError::CaseListBranchError { is_empty: true, branches: 1, .. })
        ));
        assert!(matches!(
            case_on_constant(&empty, 2, &Env::new()),
            Ok((1, ref args)) if args.is_empty()
        ));
    }

    #[test]
    fn data_case_selects_by_constructor() {
        let data = Constant::Data(PlutusData::integer(9));
        let (index, args) = case_on_constant(&data, 5, &Env::new()).unwrap();
        assert_eq!(index, 3);
        assert_eq!(args[0].as_constant(), Some(&Constant::integer(9)));
        assert!(matches!(
            case_on_constant(&data, 3, &Env::new()),
            Err(MachineError::CaseDataBranchError { constructor: 3, branches: 3, .. })
        ));
    }

    #[test]
    fn strings_cannot_be_scrutinised() {
        assert!(matches!(
            case_on_constant(&Constant::String("x".into()), 1, &Env::new()),
            Err(MachineError::NonConstrScrutinized { .. })
        ));
    }
}
