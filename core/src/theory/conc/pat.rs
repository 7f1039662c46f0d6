use crate::theory::abs::data::Term;
use crate::theory::abs::def::{Body, Head};
use crate::theory::abs::pat::{CtorPat, Matching, NatShape, Pat};
use crate::theory::abs::subst::Subst;
use crate::theory::conc::data::{Clause, Pattern};
use crate::theory::conc::elab::Elaborator;
use crate::theory::ParamInfo::Implicit;
use crate::theory::{Loc, Tele, Var};
use crate::Error;

impl<'a> Elaborator<'a> {
    /// Elaborate one clause against `tele`, then check its body against
    /// `ret` instantiated by the patterns.
    pub fn clause(&mut self, tele: &Tele<Term>, ret: &Term, c: Clause) -> Result<Matching, Error> {
        let loc = c.loc;
        self.scoped(|el| {
            let (pats, mut s) = el.patterns(tele, c.pats, loc)?;
            let ret = s.term(ret.clone());
            let absurd = pats.iter().any(Pat::is_absurd);
            let body = match (c.body, absurd) {
                (Some(b), false) => Some(el.check(b, &ret)?.0),
                (None, true) => None,
                (Some(b), true) => return Err(Error::AbsurdBody(b.loc())),
                (None, false) => return Err(Error::MissingBody(loc)),
            };
            Ok(Matching { loc, pats, body })
        })
    }

    /// Patterns for a telescope, inserting binds for omitted implicit
    /// parameters. Returns the substitution from parameters to the pattern
    /// terms.
    fn patterns(
        &mut self,
        tele: &Tele<Term>,
        pats: Vec<Pattern>,
        loc: Loc,
    ) -> Result<(Vec<Pat>, Subst), Error> {
        let mut s = Subst::default();
        let mut ret = Vec::default();
        let mut input = pats.into_iter().peekable();
        for p in tele {
            let ty = s.term(*p.typ.clone());
            let next = match p.info {
                Implicit => match input.next_if(|q| matches!(q, Pattern::Implicit(_))) {
                    Some(Pattern::Implicit(q)) => *q,
                    _ => Pattern::Bind(loc, p.var.copy()),
                },
                _ => match input.next() {
                    Some(Pattern::Implicit(q)) => return Err(Error::LicitMismatch(q.loc())),
                    Some(q) => q,
                    None => return Err(Error::TooFewPatterns(loc)),
                },
            };
            let pat = self.pattern(next, &ty)?;
            s.insert(p.var.clone(), pat.to_term(&*self.sigma));
            ret.push(pat);
        }
        if let Some(p) = input.next() {
            return Err(Error::TooManyPatterns(p.loc()));
        }
        Ok((ret, s))
    }

    fn bind(&mut self, v: &Option<Var>, ty: &Term) {
        if let Some(v) = v {
            self.ctx.put(v.clone(), ty.clone());
        }
    }

    fn pattern(&mut self, p: Pattern, ty: &Term) -> Result<Pat, Error> {
        use Pattern::*;

        match p {
            Bind(_, v) => {
                self.ctx.put(v.clone(), ty.clone());
                Ok(Pat::Bind(v))
            }
            Wildcard(_) => {
                let v = Var::unbound();
                self.ctx.put(v.clone(), ty.clone());
                Ok(Pat::Bind(v))
            }
            Implicit(p) => Err(Error::LicitMismatch(p.loc())),
            Absurd(loc) => match self.whnf(ty.clone(), loc)? {
                Term::DataCall(c) => match self.sigma.def(&c.def).map(|d| &d.body) {
                    Some(Body::Data(ctors)) if ctors.is_empty() => Ok(Pat::Absurd),
                    _ => Err(Error::NotAbsurd(Term::DataCall(c), loc)),
                },
                ty => Err(Error::NotAbsurd(ty, loc)),
            },
            Number(loc, n) => match self.whnf(ty.clone(), loc)? {
                Term::DataCall(c) if NatShape::of(&*self.sigma, &c.def).is_some() => Ok(Pat::Lit(n, c)),
                ty => Err(Error::LitMismatch(n, ty, loc)),
            },
            Tuple(loc, ps, as_bind) => match self.whnf(ty.clone(), loc)? {
                Term::Sigma(tele) if tele.len() == ps.len() => {
                    let (ps, _) = self.patterns(&tele, ps, loc)?;
                    self.bind(&as_bind, ty);
                    Ok(Pat::Tuple(ps, as_bind))
                }
                Term::Sigma(_) => Err(Error::TupleArity(loc)),
                ty => Err(Error::ExpectedSigma(ty, loc)),
            },
            Ctor(loc, v, ps, as_bind) => {
                let ty = self.whnf(ty.clone(), loc)?;
                if self.prims.id_of(&v).is_some_and(|id| id.is_endpoint()) {
                    if !self.prims.is_interval(&ty) {
                        return Err(Error::UnknownCtor(v, ty, loc));
                    }
                    if let Some(p) = ps.first() {
                        return Err(Error::TooManyPatterns(p.loc()));
                    }
                    return Ok(Pat::Prim(v));
                }
                let c = match ty.clone() {
                    Term::DataCall(c) => c,
                    ty => return Err(Error::UnknownCtor(v, ty, loc)),
                };
                let sig = match self.sigma.sig(&v) {
                    Some(sig) if sig.head == Head::Ctor(c.def.clone()) => sig.fresh(&c.sort),
                    _ => return Err(Error::UnknownCtor(v, ty, loc)),
                };
                let sig = c.args.iter().fold(sig, |sig, a| sig.instantiate(a));
                let (args, _) = self.patterns(&sig.tele, ps, loc)?;
                self.bind(&as_bind, &ty);
                Ok(Pat::Ctor(CtorPat {
                    data: c,
                    ctor: v,
                    args,
                    as_bind,
                }))
            }
        }
    }
}
