//! Untyped Plutus Core terms with de Bruijn-indexed variables.

use std::fmt;
use std::sync::{Arc, OnceLock};

use dashu_int::IBig;

use crate::builtins::DefaultFunction;
use crate::constant::Constant;

/// A variable occurrence: the source name, kept for diagnostics, and the
/// 1-based de Bruijn index of its binder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Name {
    pub text: String,
    pub index: usize,
}

/// Program term. Subterms are shared through `Arc`, so closures and frames can
/// hold on to a term without copying it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Term {
    Var(Name),
    LamAbs {
        name: Arc<str>,
        body: Arc<Term>,
    },
    Apply {
        function: Arc<Term>,
        argument: Arc<Term>,
    },
    Delay(Arc<Term>),
    Force(Arc<Term>),
    Const(Arc<Constant>),
    Builtin(DefaultFunction),
    Error,
    Constr {
        tag: u64,
        fields: Arc<[Term]>,
    },
    Case {
        scrutinee: Arc<Term>,
        branches: Arc<[Term]>,
    },
}

impl Term {
    pub fn var(text: impl Into<String>, index: usize) -> Self {
        Term::Var(Name {
            text: text.into(),
            index,
        })
    }

    pub fn lambda(name: &str, body: Term) -> Self {
        Term::LamAbs {
            name: Arc::from(name),
            body: Arc::new(body),
        }
    }

    pub fn apply(function: Term, argument: Term) -> Self {
        Term::Apply {
            function: Arc::new(function),
            argument: Arc::new(argument),
        }
    }

    /// Left-nested application of `function` to each argument in turn
    pub fn apply_all(function: Term, arguments: impl IntoIterator<Item = Term>) -> Self {
        arguments.into_iter().fold(function, Term::apply)
    }

    pub fn delay(body: Term) -> Self {
        Term::Delay(Arc::new(body))
    }

    pub fn force(body: Term) -> Self {
        Term::Force(Arc::new(body))
    }

    pub fn constant(constant: Constant) -> Self {
        Term::Const(Arc::new(constant))
    }

    pub fn integer(value: impl Into<IBig>) -> Self {
        Term::constant(Constant::Integer(value.into()))
    }

    pub fn byte_string(value: impl Into<Vec<u8>>) -> Self {
        Term::constant(Constant::ByteString(value.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Term::constant(Constant::String(value.into()))
    }

    pub fn bool(value: bool) -> Self {
        Term::constant(Constant::Bool(value))
    }

    pub fn unit() -> Self {
        Term::constant(Constant::Unit)
    }

    pub fn builtin(fun: DefaultFunction) -> Self {
        Term::Builtin(fun)
    }

    pub fn constr(tag: u64, fields: Vec<Term>) -> Self {
        Term::Constr {
            tag,
            fields: fields.into(),
        }
    }

    pub fn case(scrutinee: Term, branches: Vec<Term>) -> Self {
        Term::Case {
            scrutinee: Arc::new(scrutinee),
            branches: branches.into(),
        }
    }

    /// Move every directly owned child out of `self`, leaving a shared
    /// placeholder behind.
    fn detach_children(&mut self, out: &mut Vec<Arc<Term>>) {
        match self {
            Term::LamAbs { body, .. } | Term::Delay(body) | Term::Force(body) => {
                out.push(std::mem::replace(body, placeholder()));
            }
            Term::Apply { function, argument } => {
                out.push(std::mem::replace(function, placeholder()));
                out.push(std::mem::replace(argument, placeholder()));
            }
            Term::Constr { fields, .. } => detach_all(fields, out),
            Term::Case {
                scrutinee,
                branches,
            } => {
                out.push(std::mem::replace(scrutinee, placeholder()));
                detach_all(branches, out);
            }
            Term::Var(_) | Term::Const(_) | Term::Builtin(_) | Term::Error => {}
        }
    }
}

fn placeholder() -> Arc<Term> {
    static LEAF: OnceLock<Arc<Term>> = OnceLock::new();
    LEAF.get_or_init(|| Arc::new(Term::Error)).clone()
}

fn detach_all(terms: &mut Arc<[Term]>, out: &mut Vec<Arc<Term>>) {
    if let Some(terms) = Arc::get_mut(terms) {
        for term in terms {
            out.push(Arc::new(std::mem::replace(term, Term::Error)));
        }
    }
}

/// Tear down with an explicit work list; program terms can be nested far
/// deeper than the native stack allows.
impl Drop for Term {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(child) = pending.pop() {
            if let Ok(mut term) = Arc::try_unwrap(child) {
                term.detach_children(&mut pending);
            }
        }
    }
}

/// Rendered with a work list, like `Drop`, so deep terms print without
/// exhausting the native stack.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'a> {
            Term(&'a Term),
            Text(&'static str),
        }

        fn push_spaced<'a>(pending: &mut Vec<Piece<'a>>, terms: &'a [Term]) {
            for term in terms.iter().rev() {
                pending.push(Piece::Term(term));
                pending.push(Piece::Text(" "));
            }
        }

        let mut pending = vec![Piece::Term(self)];
        while let Some(piece) = pending.pop() {
            let term = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Term(term) => term,
            };
            match term {
                Term::Var(name) => write!(f, "{}_{}", name.text, name.index)?,
                Term::LamAbs { name, body } => {
                    write!(f, "(lam {name} ")?;
                    pending.push(Piece::Text(")"));
                    pending.push(Piece::Term(body));
                }
                Term::Apply { function, argument } => {
                    f.write_str("[")?;
                    pending.push(Piece::Text("]"));
                    pending.push(Piece::Term(argument));
                    pending.push(Piece::Text(" "));
                    pending.push(Piece::Term(function));
                }
                Term::Delay(body) => {
                    f.write_str("(delay ")?;
                    pending.push(Piece::Text(")"));
                    pending.push(Piece::Term(body));
                }
                Term::Force(body) => {
                    f.write_str("(force ")?;
                    pending.push(Piece::Text(")"));
                    pending.push(Piece::Term(body));
                }
                Term::Const(constant) => write!(f, "(con {constant})")?,
                Term::Builtin(fun) => write!(f, "(builtin {fun})")?,
                Term::Error => f.write_str("(error)")?,
                Term::Constr { tag, fields } => {
                    write!(f, "(constr {tag}")?;
                    pending.push(Piece::Text(")"));
                    push_spaced(&mut pending, fields);
                }
                Term::Case {
                    scrutinee,
                    branches,
                } => {
                    f.write_str("(case ")?;
                    pending.push(Piece::Text(")"));
                    push_spaced(&mut pending, branches);
                    pending.push(Piece::Term(scrutinee));
                }
            }
        }
        Ok(())
    }
}
