use log::debug;
use thiserror::Error;
use ustr::Ustr;

use crate::problem::{Problem, Reporter, Severity, Stage};
use crate::theory::abs::builtin::Prims;
use crate::theory::abs::data::Term;
use crate::theory::abs::def::{Def, Sigma};
use crate::theory::abs::level::{LvlVar, Sort};
use crate::theory::abs::meta::MetaId;
use crate::theory::conc::data::Expr;
use crate::theory::conc::elab::Elaborator;
use crate::theory::conc::stmt::Decl;
use crate::theory::{Loc, Var};

pub mod problem;
pub mod theory;

#[cfg(test)]
mod tests;

const RED_ZONE: usize = 512 * 1024;
const STACK_PER_RECURSION: usize = 4 * 1024 * 1024;

pub(crate) fn maybe_grow<R, F: FnOnce() -> R>(f: F) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("expected \"{expected}\", got \"{actual}\"")]
    TypeMismatch {
        expected: Term,
        actual: Term,
        loc: Loc,
    },
    #[error("universe \"{0}\" does not fit in \"{1}\"")]
    LevelMismatch(Sort, Sort, Loc),
    #[error("unsolved level \"{0}\"")]
    UnsolvedLevel(LvlVar, Loc),
    #[error("unsolved hole \"{0}\"")]
    UnsolvedMeta(MetaId, Loc),
    #[error("cannot solve \"{0}\": arguments are not distinct variables")]
    BadSpine(Term, Loc),
    #[error("solution \"{0}\" mentions \"{1}\", which is out of scope")]
    BadlyScoped(Term, Var, Loc),
    #[error("hole \"{0}\" occurs in its own solution")]
    RecursiveSolution(Term, Loc),

    #[error("expected a universe, got \"{0}\"")]
    ExpectedUniv(Term, Loc),
    #[error("expected a function type, got \"{0}\"")]
    ExpectedPi(Term, Loc),
    #[error("expected a tuple type, got \"{0}\"")]
    ExpectedSigma(Term, Loc),
    #[error("expected a struct type, got \"{0}\"")]
    ExpectedStruct(Term, Loc),
    #[error("tuple arity mismatch")]
    TupleArity(Loc),
    #[error("projection index {0} out of range")]
    ProjOutOfRange(usize, Loc),
    #[error("no field \"{0}\" in \"{1}\"")]
    NoSuchField(String, Term, Loc),
    #[error("missing field \"{0}\"")]
    MissingField(Var, Loc),
    #[error("literal {0} cannot have type \"{1}\"")]
    LitMismatch(u64, Term, Loc),
    #[error("implicitness mismatch")]
    LicitMismatch(Loc),
    #[error("\"{0}\" is not yet checked")]
    NotYetTycked(Var, Loc),

    #[error("too few patterns")]
    TooFewPatterns(Loc),
    #[error("too many patterns")]
    TooManyPatterns(Loc),
    #[error("\"{0}\" is not a constructor of \"{1}\"")]
    UnknownCtor(Var, Term, Loc),
    #[error("\"{0}\" is not an empty type")]
    NotAbsurd(Term, Loc),
    #[error("absurd clause with a body")]
    AbsurdBody(Loc),
    #[error("clause without a body")]
    MissingBody(Loc),
    #[error("cannot split on \"{0}\"")]
    NotSplittable(Term, Loc),
    #[error("missing case \"{0}\"")]
    MissingCase(String, Loc),
    #[error("redundant clause")]
    RedundantClause(Loc),
    #[error("overlapping clauses disagree: \"{lhs}\" and \"{rhs}\"")]
    Confluence { lhs: Term, rhs: Term, loc: Loc },
    #[error("conditions not satisfied: expected \"{expected}\", got \"{actual}\"")]
    Conditions {
        expected: Term,
        actual: Term,
        loc: Loc,
    },
    #[error("conditions not satisfied: no clause applies where \"{expected}\" is expected")]
    ConditionsStuck { expected: Term, loc: Loc },

    #[error("unknown primitive \"{0}\"")]
    UnknownPrim(Ustr, Loc),
    #[error("primitive \"{0}\" already declared")]
    RedefinedPrim(Ustr, Loc),
    #[error("primitive \"{0}\" requires \"{1}\" first")]
    PrimDependency(Ustr, Ustr, Loc),

    #[error("\"{0}\" may not terminate")]
    NonTerminating(Var, Loc),
    #[error("member \"{0}\" not found after its owner")]
    MissingMember(Var, Loc),
    #[error("\"{0}\" appears without its owner")]
    Orphan(Var, Loc),
}

impl Error {
    pub fn loc(&self) -> Loc {
        use Error::*;
        match self {
            TypeMismatch { loc, .. }
            | Confluence { loc, .. }
            | Conditions { loc, .. }
            | ConditionsStuck { loc, .. } => *loc,
            LevelMismatch(_, _, loc) | BadlyScoped(_, _, loc) | PrimDependency(_, _, loc) => *loc,
            NoSuchField(_, _, loc) => *loc,
            UnsolvedLevel(_, loc)
            | UnsolvedMeta(_, loc)
            | BadSpine(_, loc)
            | RecursiveSolution(_, loc)
            | ExpectedUniv(_, loc)
            | ExpectedPi(_, loc)
            | ExpectedSigma(_, loc)
            | ExpectedStruct(_, loc)
            | ProjOutOfRange(_, loc)
            | MissingField(_, loc)
            | LitMismatch(_, _, loc)
            | NotYetTycked(_, loc)
            | UnknownCtor(_, _, loc)
            | NotAbsurd(_, loc)
            | NotSplittable(_, loc)
            | MissingCase(_, loc)
            | UnknownPrim(_, loc)
            | RedefinedPrim(_, loc)
            | NonTerminating(_, loc)
            | MissingMember(_, loc)
            | Orphan(_, loc) => *loc,
            TupleArity(loc)
            | LicitMismatch(loc)
            | TooFewPatterns(loc)
            | TooManyPatterns(loc)
            | AbsurdBody(loc)
            | MissingBody(loc)
            | RedundantClause(loc) => *loc,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Error::NonTerminating(..) => Stage::Terck,
            Error::MissingMember(..) | Error::Orphan(..) => Stage::Resolve,
            _ => Stage::Tyck,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Error::RedundantClause(_) => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

/// A checking session. Definitions checked by one `check` call are visible
/// to the next.
pub struct Driver<R: Reporter> {
    reporter: R,
    prims: Prims,
    sigma: Sigma,
    generation: u32,
}

impl<R: Reporter> Driver<R> {
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            prims: Default::default(),
            sigma: Default::default(),
            generation: 0,
        }
    }

    /// Check `defs` in order. Returns whether no error was reported.
    pub fn check(&mut self, defs: Vec<Def<Expr>>) -> bool {
        let (decls, errors) = Decl::group(defs);
        let mut ok = errors.is_empty();
        for e in errors {
            self.report(e);
        }
        for d in decls {
            ok &= self.decl(d);
        }
        ok
    }

    fn decl(&mut self, d: Decl) -> bool {
        self.generation += 1;
        let name = d.def().name.clone();
        let mut el = Elaborator::new(&mut self.sigma, &mut self.prims, self.generation);
        let ret = el.decl(d);
        let problems = std::mem::take(&mut el.problems);
        drop(el);

        let mut ok = match ret {
            Ok(()) => {
                let names = self.sigma.commit();
                debug!("checked {name} ({} definition(s))", names.len());
                true
            }
            Err(e) => {
                debug!("failed {name}: {e}");
                self.sigma.rollback();
                self.report(e);
                false
            }
        };
        for e in problems {
            ok &= e.severity() != Severity::Error;
            self.report(e);
        }
        ok
    }

    fn report(&mut self, error: Error) {
        self.reporter.report(Problem::new(error));
    }

    pub fn sigma(&self) -> &Sigma {
        &self.sigma
    }

    pub fn prims(&self) -> &Prims {
        &self.prims
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }
}
