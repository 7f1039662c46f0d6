use std::collections::HashSet;

use log::trace;
use strum::Display;

use crate::theory::abs::builtin::Prims;
use crate::theory::abs::data::{Call, ConCall, Term};
use crate::theory::abs::def::{Body, Sigma};
use crate::theory::abs::level::Sort;
use crate::theory::abs::meta::TyckState;
use crate::theory::abs::normalize::Normalizer;
use crate::theory::abs::subst::{subst, Subst};
use crate::theory::conc::ctx::LocalCtx;
use crate::theory::ParamInfo::Explicit;
use crate::theory::{Loc, Param, Tele, Var};
use crate::{maybe_grow, Error};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum Ordering {
    #[strum(serialize = "<=")]
    Lt,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = ">=")]
    Gt,
}

/// A hole equation whose spine was not a pattern when first met.
#[derive(Debug, Clone)]
pub struct Eqn {
    pub lhs: Term,
    pub rhs: Term,
    pub cmp: Ordering,
    pub ctx: Tele<Term>,
    pub loc: Loc,
}

/// Placeholder type for terms whose type the untyped pass cannot recover.
fn unknown() -> Term {
    Term::Erroneous(Box::new(Term::omega()))
}

pub struct Unifier<'a> {
    sigma: &'a Sigma,
    prims: &'a Prims,
    state: &'a mut TyckState,
    ctx: &'a mut LocalCtx,
    cmp: Ordering,
    strict: bool,
    loc: Loc,
}

impl<'a> Unifier<'a> {
    pub fn new(
        sigma: &'a Sigma,
        prims: &'a Prims,
        state: &'a mut TyckState,
        ctx: &'a mut LocalCtx,
        loc: Loc,
    ) -> Self {
        Self {
            sigma,
            prims,
            state,
            ctx,
            cmp: Ordering::Eq,
            strict: false,
            loc,
        }
    }

    pub fn ordering(mut self, cmp: Ordering) -> Self {
        self.cmp = cmp;
        self
    }

    fn nf(&self) -> Normalizer {
        Normalizer::new(self.sigma, self.prims, &self.state.metas, self.loc)
    }

    fn whnf(&self, tm: Term) -> Result<Term, Error> {
        self.nf().whnf(tm)
    }

    fn scoped<R>(
        &mut self,
        v: &Var,
        typ: &Term,
        f: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.ctx.push();
        self.ctx.put(v.clone(), typ.clone());
        let ret = f(self);
        self.ctx.pop();
        ret
    }

    fn with_cmp<R>(&mut self, cmp: Ordering, f: impl FnOnce(&mut Self) -> R) -> R {
        let old = self.cmp;
        self.cmp = cmp;
        let ret = f(self);
        self.cmp = old;
        ret
    }

    /// Unfold the hole at the head of `tm` if it is solved.
    fn unfold_meta(&self, tm: &Term) -> Result<Term, Error> {
        match tm.spine_head() {
            Some(m) if !self.state.metas.is_unsolved(m) => self.whnf(tm.clone()),
            _ => Ok(tm.clone()),
        }
    }

    /// Typed comparison.
    pub fn compare(&mut self, lhs: &Term, rhs: &Term, ty: &Term) -> Result<bool, Error> {
        maybe_grow(move || self.compare_impl(lhs, rhs, ty))
    }

    fn compare_impl(&mut self, lhs: &Term, rhs: &Term, ty: &Term) -> Result<bool, Error> {
        use Term::*;

        if lhs == rhs {
            return Ok(true);
        }
        let lhs = &self.unfold_meta(lhs)?;
        let rhs = &self.unfold_meta(rhs)?;
        let flex = lhs.spine_head().is_some() || rhs.spine_head().is_some();

        match self.whnf(ty.clone())? {
            Pi(p, b) => {
                let x = p.var.copy();
                self.scoped(&x, &p.typ, |u| {
                    let arg = [Ref(x.clone())];
                    let l = u.nf().apply(lhs.clone(), p.info, &arg)?;
                    let r = u.nf().apply(rhs.clone(), p.info, &arg)?;
                    let b = subst(*b, &p.var, Ref(x.clone()));
                    u.compare(&l, &r, &b)
                })
            }
            Sigma(tele) if !flex => {
                let mut s = Subst::default();
                for (i, p) in tele.into_iter().enumerate() {
                    let l = self.nf().project(lhs.clone(), i + 1)?;
                    let r = self.nf().project(rhs.clone(), i + 1)?;
                    let t = s.term(*p.typ);
                    if !self.compare(&l, &r, &t)? {
                        return Ok(false);
                    }
                    s.insert(p.var, l);
                }
                Ok(true)
            }
            StructCall(c) if !flex => match self.struct_fields(&c) {
                Some(fields) => {
                    for (f, this, t) in fields {
                        let t = subst(t, &this, lhs.clone());
                        let l = Access(Box::new(lhs.clone()), f.clone(), Default::default());
                        let r = Access(Box::new(rhs.clone()), f, Default::default());
                        if !self.compare(&l, &r, &t)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                None => Ok(self.compare_untyped(lhs, rhs)?.is_some()),
            },
            _ => Ok(self.compare_untyped(lhs, rhs)?.is_some()),
        }
    }

    /// Nullary fields of a struct with the instance variable their types
    /// mention. `None` if some field takes arguments.
    fn struct_fields(&self, c: &Call) -> Option<Vec<(Var, Var, Term)>> {
        let Body::Struct(fields) = &self.sigma.def(&c.def)?.body else {
            return None;
        };
        let mut ret = Vec::default();
        for f in fields {
            let mut sig = self.sigma.sig(f)?.fresh(&c.sort);
            for a in &c.args {
                sig = sig.instantiate(a);
            }
            if sig.tele.len() != 1 {
                return None;
            }
            let this = sig.tele.remove(0);
            ret.push((f.clone(), this.var, sig.result));
        }
        Some(ret)
    }

    /// Untyped comparison, returning the type of both sides on success.
    pub fn compare_untyped(&mut self, lhs: &Term, rhs: &Term) -> Result<Option<Term>, Error> {
        maybe_grow(move || self.untyped_impl(lhs, rhs))
    }

    fn untyped_impl(&mut self, lhs: &Term, rhs: &Term) -> Result<Option<Term>, Error> {
        use Term::*;

        let lhs = self.unfold_meta(lhs)?;
        let rhs = self.unfold_meta(rhs)?;
        if lhs.spine_head().is_some() {
            return self.solve(&lhs, &rhs);
        }
        if rhs.spine_head().is_some() {
            return self.solve(&rhs, &lhs);
        }

        match (&lhs, &rhs) {
            (FnCall(a), FnCall(b)) | (PrimCall(a), PrimCall(b)) if a.def == b.def => {
                let saved = self.state.clone();
                match self.compare_call(a, b) {
                    Ok(Some(ty)) => return Ok(Some(ty)),
                    Ok(None) | Err(Error::LevelMismatch(..)) => *self.state = saved,
                    Err(e) => return Err(e),
                }
            }
            _ => {}
        }

        let l = self.whnf(lhs)?;
        let r = self.whnf(rhs)?;
        if l.spine_head().is_some() || r.spine_head().is_some() {
            return self.untyped_impl(&l, &r);
        }
        self.congruence(l, r)
    }

    fn congruence(&mut self, lhs: Term, rhs: Term) -> Result<Option<Term>, Error> {
        use Term::*;

        Ok(match (lhs, rhs) {
            (Ref(x), Ref(y)) if x == y => Some(self.ctx.get(&x).cloned().unwrap_or_else(unknown)),
            (Univ(a), Univ(b)) => {
                self.state.levels.add(&a, &b, self.cmp, self.loc)?;
                Some(Univ(a.lift(1)))
            }
            (Pi(p, a), Pi(q, b)) if p.info == q.info => {
                let dom = self.with_cmp(Ordering::Eq, |u| u.compare(&p.typ, &q.typ, &Term::omega()))?;
                if !dom {
                    return Ok(None);
                }
                let x = p.var.copy();
                let ok = self.scoped(&x, &p.typ, |u| {
                    let a = subst(*a, &p.var, Ref(x.clone()));
                    let b = subst(*b, &q.var, Ref(x.clone()));
                    u.compare(&a, &b, &Term::omega())
                })?;
                ok.then(Term::omega)
            }
            (Sigma(ts), Sigma(us)) if ts.len() == us.len() => {
                if self.telescopes(ts, us)? {
                    Some(Term::omega())
                } else {
                    None
                }
            }
            (Lam(p, a), Lam(q, b)) if p.info == q.info => {
                let x = p.var.copy();
                let ty = self.scoped(&x, &p.typ, |u| {
                    let a = subst(*a, &p.var, Ref(x.clone()));
                    let b = subst(*b, &q.var, Ref(x.clone()));
                    u.compare_untyped(&a, &b)
                })?;
                ty.map(|t| Pi(Param::new(x, p.info, *p.typ), Box::new(t)))
            }
            (App(f, i, x), App(g, j, y)) if i == j => {
                let Some(fty) = self.compare_untyped(&f, &g)? else {
                    return Ok(None);
                };
                match self.whnf(fty)? {
                    Pi(p, b) => self
                        .compare(&x, &y, &p.typ)?
                        .then(|| subst(*b, &p.var, *x)),
                    _ => self.compare_untyped(&x, &y)?.map(|_| unknown()),
                }
            }
            (Proj(a, i), Proj(b, j)) if i == j => {
                let Some(ty) = self.compare_untyped(&a, &b)? else {
                    return Ok(None);
                };
                match self.whnf(ty)? {
                    Sigma(tele) if i >= 1 && i <= tele.len() => {
                        let mut s = Subst::default();
                        for (k, p) in tele.iter().take(i - 1).enumerate() {
                            s.insert(p.var.clone(), Proj(a.clone(), k + 1));
                        }
                        Some(s.term(*tele[i - 1].typ.clone()))
                    }
                    _ => Some(unknown()),
                }
            }
            (Tuple(xs), Tuple(ys)) if xs.len() == ys.len() => {
                let mut tele = Tele::default();
                for (x, y) in xs.iter().zip(ys.iter()) {
                    match self.compare_untyped(x, y)? {
                        Some(t) => tele.push(Param::new(Var::unbound(), Explicit, t)),
                        None => return Ok(None),
                    }
                }
                Some(Sigma(tele))
            }
            (New(c, fs), New(d, gs)) if c.def == d.def && fs.len() == gs.len() => {
                if self.compare_call(&c, &d)?.is_none() {
                    return Ok(None);
                }
                for (f, x) in &fs {
                    let Some((_, y)) = gs.iter().find(|(g, _)| g == f) else {
                        return Ok(None);
                    };
                    if self.compare_untyped(x, y)?.is_none() {
                        return Ok(None);
                    }
                }
                Some(StructCall(c))
            }
            (Access(a, f, xs), Access(b, g, ys)) if f == g && xs.len() == ys.len() => {
                if self.compare_untyped(&a, &b)?.is_none() {
                    return Ok(None);
                }
                for (x, y) in xs.iter().zip(ys.iter()) {
                    if self.compare_untyped(x, y)?.is_none() {
                        return Ok(None);
                    }
                }
                Some(unknown())
            }
            (FnCall(a), FnCall(b))
            | (DataCall(a), DataCall(b))
            | (StructCall(a), StructCall(b))
            | (PrimCall(a), PrimCall(b))
                if a.def == b.def =>
            {
                self.compare_call(&a, &b)?
            }
            (ConCall(a), ConCall(b)) if a.ctor == b.ctor => self.compare_con(&a, &b)?,
            (Erroneous(_), _) | (_, Erroneous(_)) => Some(unknown()),
            _ => None,
        })
    }

    fn telescopes(&mut self, ts: Tele<Term>, us: Tele<Term>) -> Result<bool, Error> {
        let mut pushed = 0;
        let mut s = Subst::default();
        let mut ok = true;
        for (p, q) in ts.into_iter().zip(us) {
            let t = s.term(*q.typ);
            match self.compare(&p.typ, &t, &Term::omega()) {
                Ok(true) => {}
                Ok(false) => {
                    ok = false;
                    break;
                }
                Err(e) => {
                    (0..pushed).for_each(|_| self.ctx.pop());
                    return Err(e);
                }
            }
            self.ctx.push();
            self.ctx.put(p.var.clone(), *p.typ);
            pushed += 1;
            s.insert(q.var, Term::Ref(p.var));
        }
        (0..pushed).for_each(|_| self.ctx.pop());
        Ok(ok)
    }

    /// Compare arguments of two calls to the same definition under its
    /// telescope, with the universe instances compared for equality.
    fn compare_call(&mut self, a: &Call, b: &Call) -> Result<Option<Term>, Error> {
        let sig = self
            .sigma
            .sig(&a.def)
            .ok_or_else(|| Error::NotYetTycked(a.def.clone(), self.loc))?
            .fresh(&a.sort);
        self.state.levels.add(&a.sort, &b.sort, Ordering::Eq, self.loc)?;
        if a.args.len() != b.args.len() {
            return Ok(None);
        }
        let mut sig = sig;
        for (x, y) in a.args.iter().zip(b.args.iter()) {
            let ty = match sig.ctx.first().or_else(|| sig.tele.first()) {
                Some(p) => *p.typ.clone(),
                None => return Ok(None),
            };
            if !self.with_cmp(Ordering::Eq, |u| u.compare(x, y, &ty))? {
                return Ok(None);
            }
            sig = sig.instantiate(x);
        }
        Ok(Some(if sig.tele.is_empty() {
            sig.result
        } else {
            Term::pi(&sig.tele, sig.result)
        }))
    }

    fn compare_con(&mut self, a: &ConCall, b: &ConCall) -> Result<Option<Term>, Error> {
        if self.compare_call(&a.data, &b.data)?.is_none() {
            return Ok(None);
        }
        let mut sig = self
            .sigma
            .sig(&a.ctor)
            .ok_or_else(|| Error::NotYetTycked(a.ctor.clone(), self.loc))?
            .fresh(&a.data.sort);
        for x in &a.data.args {
            sig = sig.instantiate(x);
        }
        if a.args.len() != b.args.len() {
            return Ok(None);
        }
        for (x, y) in a.args.iter().zip(b.args.iter()) {
            let Some(p) = sig.tele.first() else {
                return Ok(None);
            };
            let ty = *p.typ.clone();
            if !self.with_cmp(Ordering::Eq, |u| u.compare(x, y, &ty))? {
                return Ok(None);
            }
            sig = sig.instantiate(x);
        }
        Ok(Some(Term::DataCall(a.data.clone())))
    }

    /// Eta-reduce a spine argument down to a local, if it is one.
    fn spine_var(tm: &Term) -> Option<Var> {
        use Term::*;
        match tm {
            Ref(v) => Some(v.clone()),
            Lam(p, b) => match b.as_ref() {
                App(f, _, x) if matches!(x.as_ref(), Ref(y) if y == &p.var) && !f.mentions(&p.var) => {
                    Self::spine_var(f)
                }
                _ => None,
            },
            Tuple(xs) if !xs.is_empty() => {
                let mut base = None;
                for (i, x) in xs.iter().enumerate() {
                    match x {
                        Proj(a, k) if *k == i + 1 => match &base {
                            None => base = Some(a.as_ref().clone()),
                            Some(b) if b == a.as_ref() => {}
                            _ => return None,
                        },
                        _ => return None,
                    }
                }
                base.as_ref().and_then(Self::spine_var)
            }
            _ => None,
        }
    }

    /// Solve the hole at the head of `flex` with `other`.
    fn solve(&mut self, flex: &Term, other: &Term) -> Result<Option<Term>, Error> {
        use Term::*;

        let (head, spine) = flex.unapply();
        let MetaCall(m, cargs) = head else {
            return Ok(None);
        };
        let m = *m;
        let Some(meta) = self.state.metas.get(m) else {
            return Err(Error::BadSpine(flex.clone(), self.loc));
        };
        let ctx = meta.ctx.clone();
        let result = meta.result.clone();

        // Type of `flex`, and the binders the solution abstracts over.
        let mut ty = Subst::tele(&ctx, cargs).term(result.clone());
        let mut own = result;
        let mut lam = Tele::default();
        for x in &spine {
            ty = match self.whnf(ty)? {
                Pi(p, b) => subst(*b, &p.var, (*x).clone()),
                _ => unknown(),
            };
            own = match self.whnf(own)? {
                Pi(p, b) => {
                    let q = p.var.copy();
                    lam.push(Param::new(q.clone(), p.info, *p.typ));
                    subst(*b, &p.var, Ref(q))
                }
                _ => {
                    lam.push(Param::new(Var::new("x"), Explicit, unknown()));
                    unknown()
                }
            };
        }

        if let (Some(n), true) = (other.spine_head(), flex == other) {
            if n == m {
                return Ok(Some(ty));
            }
        }

        let args = cargs.iter().chain(spine.iter().copied());
        let vars = args.map(Self::spine_var).collect::<Option<Vec<_>>>();
        let vars = match vars {
            Some(vs) if vs.iter().collect::<HashSet<_>>().len() == vs.len() => vs,
            _ => return self.defer(flex, other, ty),
        };

        let targets = ctx
            .iter()
            .chain(lam.iter())
            .map(|p| p.var.clone())
            .collect::<Vec<_>>();
        let allowed = targets.iter().cloned().collect::<HashSet<_>>();
        let mut s = Subst::new(
            vars.iter()
                .cloned()
                .zip(targets.into_iter().map(Ref))
                .collect(),
        );

        let mut rhs = other.clone();
        let mut normalized = false;
        let body = loop {
            let recursive = rhs.mentions_meta(m);
            let body = s.term(rhs.clone());
            let bad = body.free_vars().into_iter().find(|v| !allowed.contains(v));
            match (recursive, bad) {
                (false, None) => break body,
                _ if !normalized => {
                    rhs = self.nf().nf(rhs)?;
                    normalized = true;
                }
                (true, _) => return Err(Error::RecursiveSolution(flex.clone(), self.loc)),
                (false, Some(v)) => return Err(Error::BadlyScoped(other.clone(), v, self.loc)),
            }
        };

        if let Univ(s) = self.whnf(ty.clone())? {
            if let Some(r) = self.sort_of(other)? {
                self.state.levels.add(&r, &s, Ordering::Lt, self.loc)?;
            }
        }

        let sol = Term::lam(&lam, body);
        trace!("solved {m} := {sol}");
        self.state
            .metas
            .solve(m, sol)
            .map_err(|_| Error::RecursiveSolution(flex.clone(), self.loc))?;
        Ok(Some(ty))
    }

    /// The universe a type-shaped term lives in, when it is cheap to tell.
    fn sort_of(&self, tm: &Term) -> Result<Option<Sort>, Error> {
        use Term::*;
        Ok(match self.whnf(tm.clone())? {
            Univ(s) => Some(s.lift(1)),
            DataCall(c) | StructCall(c) | PrimCall(c) => match self.sigma.sig(&c.def) {
                Some(sig) => match self.whnf(sig.fresh(&c.sort).result)? {
                    Univ(s) => Some(s),
                    _ => None,
                },
                None => None,
            },
            _ => None,
        })
    }

    fn defer(&mut self, lhs: &Term, rhs: &Term, ty: Term) -> Result<Option<Term>, Error> {
        if self.strict {
            return Err(Error::BadSpine(lhs.clone(), self.loc));
        }
        trace!("deferred {lhs} {} {rhs}", self.cmp);
        self.state.eqns.push(Eqn {
            lhs: lhs.clone(),
            rhs: rhs.clone(),
            cmp: self.cmp,
            ctx: self.ctx.extract(),
            loc: self.loc,
        });
        Ok(Some(ty))
    }

    /// Retry deferred equations until no progress is made, then once more
    /// in strict mode where a non-pattern spine is an error.
    pub fn solve_deferred(&mut self) -> Result<(), Error> {
        loop {
            let eqns = std::mem::take(&mut self.state.eqns);
            if eqns.is_empty() {
                return Ok(());
            }
            let before = eqns.len();
            for e in eqns {
                self.retry(e)?;
            }
            if self.state.eqns.len() >= before {
                self.strict = true;
                for e in std::mem::take(&mut self.state.eqns) {
                    self.retry(e)?;
                }
                self.strict = false;
                return Ok(());
            }
        }
    }

    fn retry(&mut self, e: Eqn) -> Result<(), Error> {
        self.ctx.push();
        for p in &e.ctx {
            self.ctx.put(p.var.clone(), *p.typ.clone());
        }
        let loc = std::mem::replace(&mut self.loc, e.loc);
        let ret = self.with_cmp(e.cmp, |u| u.compare_untyped(&e.lhs, &e.rhs));
        self.loc = loc;
        self.ctx.pop();
        match ret? {
            Some(_) => Ok(()),
            None => Err(Error::TypeMismatch {
                expected: e.rhs,
                actual: e.lhs,
                loc: e.loc,
            }),
        }
    }
}
