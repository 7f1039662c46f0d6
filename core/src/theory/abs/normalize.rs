use crate::theory::abs::builtin::Prims;
use crate::theory::abs::data::{Call, ConCall, Term};
use crate::theory::abs::def::{Body, Sigma};
use crate::theory::abs::meta::Metas;
use crate::theory::abs::subst::{subst, Subst};
use crate::theory::{Loc, Param, ParamInfo, Var};
use crate::{maybe_grow, Error};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    Whnf,
    Nf,
}

pub struct Normalizer<'a> {
    sigma: &'a Sigma,
    prims: &'a Prims,
    metas: &'a Metas,
    loc: Loc,
}

impl<'a> Normalizer<'a> {
    pub fn new(sigma: &'a Sigma, prims: &'a Prims, metas: &'a Metas, loc: Loc) -> Self {
        Self {
            sigma,
            prims,
            metas,
            loc,
        }
    }

    pub fn sigma(&self) -> &'a Sigma {
        self.sigma
    }

    pub fn whnf(&self, tm: Term) -> Result<Term, Error> {
        self.term(tm, Mode::Whnf)
    }

    pub fn nf(&self, tm: Term) -> Result<Term, Error> {
        self.term(tm, Mode::Nf)
    }

    pub fn term(&self, tm: Term, mode: Mode) -> Result<Term, Error> {
        maybe_grow(move || self.term_impl(tm, mode))
    }

    fn term_box(&self, tm: Box<Term>, mode: Mode) -> Result<Box<Term>, Error> {
        Ok(Box::new(self.term(*tm, mode)?))
    }

    fn param(&self, p: Param<Term>) -> Result<Param<Term>, Error> {
        Ok(Param {
            var: p.var,
            info: p.info,
            typ: self.term_box(p.typ, Mode::Nf)?,
        })
    }

    fn terms(&self, tms: Vec<Term>, mode: Mode) -> Result<Vec<Term>, Error> {
        match mode {
            Mode::Whnf => Ok(tms),
            Mode::Nf => tms.into_iter().map(|t| self.nf(t)).collect(),
        }
    }

    fn call(&self, c: Call, mode: Mode) -> Result<Call, Error> {
        Ok(Call {
            def: c.def,
            sort: c.sort,
            args: self.terms(c.args, mode)?,
        })
    }

    /// Callees must be checked or in flight.
    fn known(&self, v: &Var) -> Result<(), Error> {
        if self.sigma.def(v).is_some() || self.sigma.sig(v).is_some() {
            return Ok(());
        }
        Err(Error::NotYetTycked(v.clone(), self.loc))
    }

    fn term_impl(&self, tm: Term, mode: Mode) -> Result<Term, Error> {
        use Mode::*;
        use Term::*;

        Ok(match tm {
            Ref(x) => Ref(x),
            Lam(p, b) => match mode {
                Whnf => Lam(p, b),
                Nf => Lam(self.param(p)?, self.term_box(b, Nf)?),
            },
            Pi(p, b) => match mode {
                Whnf => Pi(p, b),
                Nf => Pi(self.param(p)?, self.term_box(b, Nf)?),
            },
            Sigma(tele) => match mode {
                Whnf => Sigma(tele),
                Nf => Sigma(tele.into_iter().map(|p| self.param(p)).collect::<Result<_, _>>()?),
            },
            Univ(s) => Univ(s),
            App(f, i, x) => match self.whnf(*f)? {
                Lam(p, b) => self.term(subst(*b, &p.var, *x), mode)?,
                f => match mode {
                    Whnf => App(Box::new(f), i, x),
                    Nf => App(Box::new(self.nf(f)?), i, self.term_box(x, Nf)?),
                },
            },
            Proj(a, ix) => match self.whnf(*a)? {
                Tuple(mut xs) if (1..=xs.len()).contains(&ix) => self.term(xs.swap_remove(ix - 1), mode)?,
                a => match mode {
                    Whnf => Proj(Box::new(a), ix),
                    Nf => Proj(Box::new(self.nf(a)?), ix),
                },
            },
            Tuple(xs) => Tuple(self.terms(xs, mode)?),
            New(c, fields) => match mode {
                Whnf => New(c, fields),
                Nf => New(
                    self.call(c, Nf)?,
                    fields
                        .into_iter()
                        .map(|(n, x)| Ok((n, self.nf(x)?)))
                        .collect::<Result<_, Error>>()?,
                ),
            },
            FnCall(c) => match self.unfold_fn(&c)? {
                Some(tm) => self.term(tm, mode)?,
                None => FnCall(self.call(c, mode)?),
            },
            DataCall(c) => {
                self.known(&c.def)?;
                DataCall(self.call(c, mode)?)
            }
            StructCall(c) => {
                self.known(&c.def)?;
                StructCall(self.call(c, mode)?)
            }
            ConCall(c) => match self.unfold_ctor(&c)? {
                Some(tm) => self.term(tm, mode)?,
                None => ConCall(crate::theory::abs::data::ConCall {
                    data: self.call(c.data, mode)?,
                    ctor: c.ctor,
                    args: self.terms(c.args, mode)?,
                }),
            },
            PrimCall(c) => match self.prims.unfold(&c, self)? {
                Some(tm) => self.term(tm, mode)?,
                None => PrimCall(self.call(c, mode)?),
            },
            Access(a, f, args) => match self.whnf(*a)? {
                New(c, mut fields) => match fields.iter().position(|(n, _)| n == &f) {
                    Some(i) => {
                        let (_, value) = fields.swap_remove(i);
                        let applied = args
                            .into_iter()
                            .fold(value, |g, x| App(Box::new(g), ParamInfo::Explicit, Box::new(x)));
                        self.term(applied, mode)?
                    }
                    None => Access(Box::new(New(c, fields)), f, self.terms(args, mode)?),
                },
                a => match mode {
                    Whnf => Access(Box::new(a), f, args),
                    Nf => Access(Box::new(self.nf(a)?), f, self.terms(args, Nf)?),
                },
            },
            MetaCall(m, args) => match self.metas.get(m) {
                Some(meta) => match meta.solution() {
                    Some(sol) => {
                        let tm = Subst::tele(&meta.ctx, &args).renaming().term(sol.clone());
                        self.term(tm, mode)?
                    }
                    None => MetaCall(m, self.terms(args, mode)?),
                },
                None => MetaCall(m, self.terms(args, mode)?),
            },
            Erroneous(a) => Erroneous(a),
        })
    }

    fn unfold_fn(&self, c: &Call) -> Result<Option<Term>, Error> {
        let Some(def) = self.sigma.def(&c.def) else {
            self.known(&c.def)?;
            return Ok(None);
        };
        if c.args.len() < def.tele.len() {
            return Ok(None);
        }
        Ok(match &def.body {
            Body::Fn(b) => Some(
                Subst::tele(&def.tele, &c.args)
                    .with_sort(&c.sort)
                    .renaming()
                    .term(b.clone()),
            ),
            Body::Clauses(cs) => self.match_clauses(cs, &c.args, &c.sort)?,
            _ => None,
        })
    }

    fn unfold_ctor(&self, c: &ConCall) -> Result<Option<Term>, Error> {
        let Some(def) = self.sigma.def(&c.ctor) else {
            self.known(&c.ctor)?;
            return Ok(None);
        };
        match &def.body {
            Body::Ctor(b) if !b.clauses.is_empty() => {
                let Some(tm) = self.match_clauses(&b.clauses, &c.args, &c.data.sort)? else {
                    return Ok(None);
                };
                // Conditions may mention the data type's own parameters.
                Ok(Some(match self.sigma.sig(&b.data) {
                    Some(data) => Subst::tele(&data.tele, &c.data.args).term(tm),
                    None => tm,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Apply `f` to `args`, reducing the redexes this creates.
    pub fn apply(&self, f: Term, info: ParamInfo, args: &[Term]) -> Result<Term, Error> {
        let mut f = f;
        for x in args {
            f = match f {
                Term::Lam(p, b) => subst(*b, &p.var, x.clone()),
                f => Term::App(Box::new(f), info, Box::new(x.clone())),
            };
        }
        self.whnf_redex(f)
    }

    fn whnf_redex(&self, tm: Term) -> Result<Term, Error> {
        match tm {
            Term::App(..) => self.whnf(tm),
            tm => Ok(tm),
        }
    }

    pub fn project(&self, tm: Term, ix: usize) -> Result<Term, Error> {
        self.whnf(Term::Proj(Box::new(tm), ix))
    }
}
