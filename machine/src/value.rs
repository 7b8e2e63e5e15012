//! Machine values, environments and discharge back to terms.

use std::sync::Arc;

use uplc_common::{Constant, CostingInteger, MemoryUsage, Name, Term};

use crate::runtime::BuiltinRuntime;

/// One environment entry: the binder's name and the value bound to it
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: Arc<str>,
    pub value: Value,
}

/// Persistent, append-only environment. The most recent binding is last, so
/// de Bruijn index `i` resolves to position `len - i`.
pub type Env = imbl::Vector<Binding>;

/// Resolve a 1-based de Bruijn index. Index 0 and indices beyond the
/// environment are unbound.
pub fn lookup(env: &Env, index: usize) -> Option<&Value> {
    if index == 0 || index > env.len() {
        return None;
    }
    env.get(env.len() - index).map(|binding| &binding.value)
}

/// Result of evaluating a term
#[derive(Debug, Clone)]
pub enum Value {
    Con(Arc<Constant>),
    Delay(Arc<Term>, Env),
    Lambda {
        parameter: Arc<str>,
        body: Arc<Term>,
        env: Env,
    },
    Builtin(BuiltinRuntime),
    Constr(u64, Vec<Value>),
}

impl Value {
    pub fn con(constant: Constant) -> Self {
        Value::Con(Arc::new(constant))
    }

    /// The constant inside, if this is one
    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Value::Con(c) => Some(c),
            _ => None,
        }
    }

    /// Convert back to a closed term, substituting captured environments for
    /// the variables they bind.
    pub fn discharge(&self) -> Term {
        discharge(Task::Value(self))
    }
}

/// Size of a value as an argument to a builtin; non-constants count as one
impl MemoryUsage for Value {
    fn memory_usage(&self) -> CostingInteger {
        match self {
            Value::Con(c) => c.memory_usage(),
            _ => CostingInteger::ONE,
        }
    }
}

/// A partially applied builtin as a term
pub(crate) fn discharge_builtin(runtime: &BuiltinRuntime) -> Term {
    discharge(Task::Builtin(runtime))
}

/// Pending discharge work. `Term` carries the number of lambdas between the
/// environment and the term, which shadow the outermost indices.
enum Task<'a> {
    Value(&'a Value),
    Builtin(&'a BuiltinRuntime),
    Term {
        binders: usize,
        env: &'a Env,
        term: &'a Term,
    },
    Build(Node),
}

/// A node to assemble from the most recent results
enum Node {
    Lambda(Arc<str>),
    Apply,
    Delay,
    Force,
    Constr { tag: u64, arity: usize },
    Case { branches: usize },
    Applied { head: Term, args: usize },
}

/// Discharge with explicit work and result stacks. Children are scheduled
/// so their results land in order, followed by the node that consumes them.
fn discharge<'a>(root: Task<'a>) -> Term {
    let mut tasks = vec![root];
    let mut results: Vec<Term> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Value(value) => match value {
                Value::Con(c) => results.push(Term::Const(c.clone())),
                Value::Delay(body, env) => {
                    tasks.push(Task::Build(Node::Delay));
                    tasks.push(Task::Term {
                        binders: 0,
                        env,
                        term: body,
                    });
                }
                Value::Lambda {
                    parameter,
                    body,
                    env,
                } => {
                    tasks.push(Task::Build(Node::Lambda(parameter.clone())));
                    tasks.push(Task::Term {
                        binders: 1,
                        env,
                        term: body,
                    });
                }
                Value::Builtin(runtime) => tasks.push(Task::Builtin(runtime)),
                Value::Constr(tag, fields) => {
                    tasks.push(Task::Build(Node::Constr {
                        tag: *tag,
                        arity: fields.len(),
                    }));
                    tasks.extend(fields.iter().rev().map(Task::Value));
                }
            },
            Task::Builtin(runtime) => {
                let args = runtime.args();
                tasks.push(Task::Build(Node::Applied {
                    head: runtime.head(),
                    args: args.len(),
                }));
                tasks.extend(args.iter().rev().map(Task::Value));
            }
            Task::Term { binders, env, term } => {
                let scoped = |term: &'a Term| Task::Term { binders, env, term };
                match term {
                    Term::Var(Name { index, .. }) if *index > binders => {
                        match lookup(env, index - binders) {
                            Some(value) => tasks.push(Task::Value(value)),
                            None => results.push(term.clone()),
                        }
                    }
                    Term::LamAbs { name, body } => {
                        tasks.push(Task::Build(Node::Lambda(name.clone())));
                        tasks.push(Task::Term {
                            binders: binders + 1,
                            env,
                            term: body,
                        });
                    }
                    Term::Apply { function, argument } => {
                        tasks.push(Task::Build(Node::Apply));
                        tasks.push(scoped(argument.as_ref()));
                        tasks.push(scoped(function.as_ref()));
                    }
                    Term::Delay(body) => {
                        tasks.push(Task::Build(Node::Delay));
                        tasks.push(scoped(body.as_ref()));
                    }
                    Term::Force(body) => {
                        tasks.push(Task::Build(Node::Force));
                        tasks.push(scoped(body.as_ref()));
                    }
                    Term::Constr { tag, fields } => {
                        tasks.push(Task::Build(Node::Constr {
                            tag: *tag,
                            arity: fields.len(),
                        }));
                        tasks.extend(fields.iter().rev().map(scoped));
                    }
                    Term::Case {
                        scrutinee,
                        branches,
                    } => {
                        tasks.push(Task::Build(Node::Case {
                            branches: branches.len(),
                        }));
                        tasks.extend(branches.iter().rev().map(scoped));
                        tasks.push(scoped(scrutinee.as_ref()));
                    }
                    Term::Var(_) | Term::Const(_) | Term::Builtin(_) | Term::Error => {
                        results.push(term.clone())
                    }
                }
            }
            Task::Build(node) => {
                let term = build(node, &mut results);
                results.push(term);
            }
        }
    }

    results.pop().unwrap_or(Term::Error)
}

fn build(node: Node, results: &mut Vec<Term>) -> Term {
    match node {
        Node::Lambda(name) => Term::LamAbs {
            name,
            body: last(results),
        },
        Node::Delay => Term::Delay(last(results)),
        Node::Force => Term::Force(last(results)),
        Node::Apply => {
            let argument = last(results);
            let function = last(results);
            Term::Apply { function, argument }
        }
        Node::Constr { tag, arity } => Term::Constr {
            tag,
            fields: take(results, arity).into(),
        },
        Node::Case { branches } => {
            let branches = take(results, branches);
            Term::Case {
                scrutinee: last(results),
                branches: branches.into(),
            }
        }
        Node::Applied { head, args } => take(results, args).into_iter().fold(head, Term::apply),
    }
}

/// The most recent result; a node's children are always beneath it
fn last(results: &mut Vec<Term>) -> Arc<Term> {
    Arc::new(results.pop().unwrap_or(Term::Error))
}

/// The last `n` results, oldest first
fn take(results: &mut Vec<Term>, n: usize) -> Vec<Term> {
    results.split_off(results.len().saturating_sub(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(env: &mut Env, name: &str, value: Value) {
        env.push_back(Binding {
            name: Arc::from(name),
            value,
        });
    }

    #[test]
    fn lookup_counts_from_the_end() {
        let mut env = Env::new();
        bind(&mut env, "a", Value::con(Constant::integer(1)));
        bind(&mut env, "b", Value::con(Constant::integer(2)));
        let int = |v: Option<&Value>| v.and_then(Value::as_constant).cloned();
        assert_eq!(int(lookup(&env, 1)), Some(Constant::integer(2)));
        assert_eq!(int(lookup(&env, 2)), Some(Constant::integer(1)));
        assert!(lookup(&env, 0).is_none());
        assert!(lookup(&env, 3).is_none());
    }

    #[test]
    fn discharge_substitutes_free_variables_only() {
        let mut env = Env::new();
        bind(&mut env, "y", Value::con(Constant::integer(7)));
        // \x. [x y] closed over y = 7
        let lambda = Value::Lambda {
            parameter: Arc::from("x"),
            body: Arc::new(Term::apply(Term::var("x", 1), Term::var("y", 2))),
            env,
        };
        assert_eq!(
            lambda.discharge(),
            Term::lambda("x", Term::apply(Term::var("x", 1), Term::integer(7)))
        );
    }

    #[test]
    fn discharge_leaves_unbound_variables() {
        let delay = Value::Delay(Arc::new(Term::var("z", 4)), Env::new());
        assert_eq!(delay.discharge(), Term::delay(Term::var("z", 4)));
    }

    #[test]
    fn discharge_is_idempotent() {
        let mut env = Env::new();
        bind(&mut env, "z", Value::con(Constant::integer(5)));
        let closure = |body: Arc<Term>, env: Env| Value::Lambda {
            parameter: Arc::from("x"),
            body,
            env,
        };
        // \x. \y. [y x z] closed over z = 5
        let body = Arc::new(Term::lambda(
            "y",
            Term::apply_all(Term::var("y", 1), [Term::var("x", 2), Term::var("z", 3)]),
        ));
        let once = closure(body, env).discharge();
        let Term::LamAbs { body, .. } = &once else {
            panic!("expected a lambda, got {once}");
        };
        assert_eq!(closure(body.clone(), Env::new()).discharge(), once);
        assert_eq!(
            once,
            Term::lambda(
                "x",
                Term::lambda(
                    "y",
                    Term::apply_all(Term::var("y", 1), [Term::var("x", 2), Term::integer(5)])
                )
            )
        );
    }

    #[test]
    fn nested_values_discharge_through_environments() {
        let mut inner = Env::new();
        bind(&mut inner, "a", Value::con(Constant::integer(1)));
        let delayed = Value::Delay(Arc::new(Term::var("a", 1)), inner);
        let mut outer = Env::new();
        bind(&mut outer, "d", Value::Constr(0, vec![delayed]));
        let value = Value::Delay(Arc::new(Term::force(Term::var("d", 1))), outer);
        assert_eq!(
            value.discharge(),
            Term::delay(Term::force(Term::constr(0, vec![Term::delay(Term::integer(1))])))
        );
    }

    #[test]
    fn case_branches_keep_their_order() {
        let mut env = Env::new();
        bind(&mut env, "v", Value::con(Constant::integer(2)));
        let body = Term::case(
            Term::var("v", 1),
            vec![Term::integer(0), Term::var("v", 1), Term::Error],
        );
        let value = Value::Delay(Arc::new(body), env);
        assert_eq!(
            value.discharge(),
            Term::delay(Term::case(
                Term::integer(2),
                vec![Term::integer(0), Term::integer(2), Term::Error]
            ))
        );
    }

    #[test]
    fn deep_bodies_discharge_without_recursion() {
        let mut body = Term::var("x", 200_001);
        for _ in 0..200_000 {
            body = Term::delay(Term::lambda("y", body));
        }
        let mut env = Env::new();
        bind(&mut env, "x", Value::con(Constant::Unit));
        let term = Value::Delay(Arc::new(body), env).discharge();
        let mut depth = 0;
        let mut cursor = &term;
        loop {
            cursor = match cursor {
                Term::Delay(inner) | Term::LamAbs { body: inner, .. } => inner.as_ref(),
                _ => break,
            };
            depth += 1;
        }
        assert_eq!(depth, 400_001);
        // x is shifted past 200k lambdas and still resolves to the binding
        assert_eq!(*cursor, Term::unit());
    }

    #[test]
    fn constr_values_discharge_field_by_field() {
        let value = Value::Constr(
            3,
            vec![Value::con(Constant::Unit), Value::con(Constant::Bool(true))],
        );
        assert_eq!(value.discharge(), Term::constr(3, vec![Term::unit(), Term::bool(true)]));
    }
}
