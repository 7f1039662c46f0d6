use std::collections::HashSet;

use crate::theory::abs::data::{Call, Term};
use crate::theory::abs::def::{Body, CtorBody, Def, FieldBody, Signature};
use crate::theory::abs::level::{LevelSubst, LvlVar, Sort};
use crate::theory::abs::meta::{MetaId, Metas};
use crate::theory::abs::pat::{CtorPat, Matching, Pat};
use crate::theory::abs::subst::{subst, Subst};
use crate::theory::{Loc, Param, Tele};
use crate::{maybe_grow, Error};

/// Replaces solved holes by their solutions and level variables by their
/// solutions. Everything left unsolved is collected, each hole and level
/// variable once.
pub struct Zonker<'a> {
    metas: &'a Metas,
    levels: &'a LevelSubst,
    loc: Loc,
    seen: HashSet<MetaId>,
    seen_levels: HashSet<LvlVar>,
    errors: Vec<Error>,
}

impl<'a> Zonker<'a> {
    pub fn new(metas: &'a Metas, levels: &'a LevelSubst, loc: Loc) -> Self {
        Self {
            metas,
            levels,
            loc,
            seen: Default::default(),
            seen_levels: Default::default(),
            errors: Default::default(),
        }
    }

    /// The problems found so far.
    pub fn finish(self) -> Vec<Error> {
        self.errors
    }

    fn sort(&mut self, s: Sort) -> Sort {
        match self.levels.sort(&s) {
            Ok(s) => s,
            Err(v) => {
                if self.seen_levels.insert(v.clone()) {
                    self.errors.push(Error::UnsolvedLevel(v, self.loc));
                }
                s
            }
        }
    }

    fn call(&mut self, c: Call) -> Call {
        Call {
            def: c.def,
            sort: self.sort(c.sort),
            args: self.terms(c.args),
        }
    }

    fn terms(&mut self, tms: Vec<Term>) -> Vec<Term> {
        tms.into_iter().map(|t| self.term(t)).collect()
    }

    fn param(&mut self, p: Param<Term>) -> Param<Term> {
        Param {
            var: p.var,
            info: p.info,
            typ: Box::new(self.term(*p.typ)),
        }
    }

    pub fn tele(&mut self, tele: Tele<Term>) -> Tele<Term> {
        tele.into_iter().map(|p| self.param(p)).collect()
    }

    pub fn term(&mut self, tm: Term) -> Term {
        maybe_grow(move || self.term_impl(tm))
    }

    fn term_impl(&mut self, tm: Term) -> Term {
        use Term::*;
        let metas = self.metas;
        match tm {
            Ref(x) => Ref(x),
            Lam(p, b) => Lam(self.param(p), Box::new(self.term(*b))),
            Pi(p, b) => Pi(self.param(p), Box::new(self.term(*b))),
            Sigma(tele) => Sigma(self.tele(tele)),
            Univ(s) => Univ(self.sort(s)),
            App(f, i, x) => match self.term(*f) {
                Lam(p, b) => {
                    let x = self.term(*x);
                    self.term(subst(*b, &p.var, x))
                }
                f => App(Box::new(f), i, Box::new(self.term(*x))),
            },
            Proj(a, ix) => match self.term(*a) {
                Tuple(mut xs) if (1..=xs.len()).contains(&ix) => xs.swap_remove(ix - 1),
                a => Proj(Box::new(a), ix),
            },
            Tuple(xs) => Tuple(self.terms(xs)),
            New(c, fields) => New(
                self.call(c),
                fields.into_iter().map(|(n, x)| (n, self.term(x))).collect(),
            ),
            FnCall(c) => FnCall(self.call(c)),
            DataCall(c) => DataCall(self.call(c)),
            StructCall(c) => StructCall(self.call(c)),
            PrimCall(c) => PrimCall(self.call(c)),
            ConCall(c) => ConCall(crate::theory::abs::data::ConCall {
                data: self.call(c.data),
                ctor: c.ctor,
                args: self.terms(c.args),
            }),
            Access(a, n, args) => Access(Box::new(self.term(*a)), n, self.terms(args)),
            MetaCall(m, args) => match metas.get(m) {
                Some(meta) => match meta.solution() {
                    Some(sol) => {
                        let tm = Subst::tele(&meta.ctx, &args).renaming().term(sol.clone());
                        self.term(tm)
                    }
                    None => {
                        if self.seen.insert(m) {
                            self.errors.push(Error::UnsolvedMeta(m, meta.loc));
                        }
                        MetaCall(m, self.terms(args))
                    }
                },
                None => MetaCall(m, self.terms(args)),
            },
            Erroneous(a) => Erroneous(Box::new(self.term(*a))),
        }
    }

    fn pat(&mut self, p: Pat) -> Pat {
        use Pat::*;
        match p {
            Lit(n, c) => Lit(n, self.call(c)),
            Tuple(ps, as_bind) => Tuple(ps.into_iter().map(|p| self.pat(p)).collect(), as_bind),
            Ctor(c) => Ctor(CtorPat {
                data: self.call(c.data),
                ctor: c.ctor,
                args: c.args.into_iter().map(|p| self.pat(p)).collect(),
                as_bind: c.as_bind,
            }),
            p => p,
        }
    }

    pub fn matching(&mut self, m: Matching) -> Matching {
        Matching {
            loc: m.loc,
            pats: m.pats.into_iter().map(|p| self.pat(p)).collect(),
            body: m.body.map(|b| self.term(b)),
        }
    }

    pub fn sig(&mut self, sig: Signature) -> Signature {
        Signature {
            head: sig.head,
            ctx: self.tele(sig.ctx),
            tele: self.tele(sig.tele),
            result: self.term(sig.result),
        }
    }

    pub fn def(&mut self, d: Def<Term>) -> Def<Term> {
        use Body::*;
        let body = match d.body {
            Fn(b) => Fn(self.term(b)),
            Clauses(cs) => Clauses(cs.into_iter().map(|m| self.matching(m)).collect()),
            Ctor(b) => Ctor(CtorBody {
                data: b.data,
                clauses: b.clauses.into_iter().map(|m| self.matching(m)).collect(),
            }),
            Field(b) => Field(FieldBody {
                structure: b.structure,
                default: b.default.map(|t| self.term(t)),
            }),
            b => b,
        };
        Def {
            loc: d.loc,
            name: d.name,
            tele: self.tele(d.tele),
            ret: Box::new(self.term(*d.ret)),
            body,
        }
    }
}
