use crate::theory::abs::builtin::Prims;
use crate::theory::abs::data::{Call, ConCall, Term};
use crate::theory::abs::def::{Body, Head, Sigma, Signature};
use crate::theory::abs::level::{Level, Sort};
use crate::theory::abs::meta::TyckState;
use crate::theory::abs::normalize::Normalizer;
use crate::theory::abs::pat::NatShape;
use crate::theory::abs::subst::{subst, Subst};
use crate::theory::abs::unify::{Ordering, Unifier};
use crate::theory::conc::ctx::LocalCtx;
use crate::theory::conc::data::{Expr, FieldInit, ProjIx, UnivLevel};
use crate::theory::ParamInfo::{Explicit, Implicit};
use crate::theory::{Loc, Param, ParamInfo, Tele, Var};
use crate::Error;

/// Checks one declaration. Holes, level equations and locals live here and
/// are dropped with the elaborator.
pub struct Elaborator<'a> {
    pub(crate) sigma: &'a mut Sigma,
    pub(crate) prims: &'a mut Prims,
    pub(crate) state: TyckState,
    pub(crate) ctx: LocalCtx,
    /// Non-fatal problems, and fatal ones beyond the first.
    pub(crate) problems: Vec<Error>,
}

impl<'a> Elaborator<'a> {
    pub fn new(sigma: &'a mut Sigma, prims: &'a mut Prims, generation: u32) -> Self {
        Self {
            sigma,
            prims,
            state: TyckState::new(generation),
            ctx: Default::default(),
            problems: Default::default(),
        }
    }

    pub(crate) fn normalizer(&self, loc: Loc) -> Normalizer {
        Normalizer::new(&*self.sigma, &*self.prims, &self.state.metas, loc)
    }

    pub(crate) fn whnf(&self, tm: Term, loc: Loc) -> Result<Term, Error> {
        self.normalizer(loc).whnf(tm)
    }

    pub(crate) fn nf(&self, tm: Term, loc: Loc) -> Result<Term, Error> {
        self.normalizer(loc).nf(tm)
    }

    pub(crate) fn unifier(&mut self, loc: Loc) -> Unifier {
        Unifier::new(&*self.sigma, &*self.prims, &mut self.state, &mut self.ctx, loc)
    }

    /// Run `f` in a new frame of locals, popped on every exit path.
    pub(crate) fn scoped<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.ctx.push();
        let ret = f(self);
        self.ctx.pop();
        ret
    }

    pub(crate) fn fresh_meta(&mut self, name: &str, ty: Term, loc: Loc) -> Term {
        let ctx = self.ctx.extract();
        let args = Term::refs(&ctx);
        let m = self.state.metas.fresh(name, ctx, ty, loc);
        Term::MetaCall(m, args)
    }

    fn fresh_type(&mut self, loc: Loc) -> Term {
        self.fresh_meta("_", Term::Univ(Sort::fresh()), loc)
    }

    pub(crate) fn mismatch(&self, expected: &Term, actual: &Term, loc: Loc) -> Error {
        Error::TypeMismatch {
            expected: self.nf(expected.clone(), loc).unwrap_or_else(|_| expected.clone()),
            actual: self.nf(actual.clone(), loc).unwrap_or_else(|_| actual.clone()),
            loc,
        }
    }

    pub(crate) fn subtype(&mut self, actual: &Term, expected: &Term, loc: Loc) -> Result<(), Error> {
        let ok = self
            .unifier(loc)
            .ordering(Ordering::Lt)
            .compare(actual, expected, &Term::omega())?;
        if ok {
            return Ok(());
        }
        Err(self.mismatch(expected, actual, loc))
    }

    pub(crate) fn unify(&mut self, lhs: &Term, rhs: &Term, ty: &Term, loc: Loc) -> Result<(), Error> {
        if self.unifier(loc).compare(lhs, rhs, ty)? {
            return Ok(());
        }
        Err(self.mismatch(rhs, lhs, loc))
    }

    fn max_sort(&mut self, a: Sort, b: Sort, loc: Loc) -> Result<Sort, Error> {
        if let Some(s) = a.max(&b) {
            return Ok(s);
        }
        let s = Sort::fresh();
        self.state.levels.add(&a, &s, Ordering::Lt, loc)?;
        self.state.levels.add(&b, &s, Ordering::Lt, loc)?;
        Ok(s)
    }

    /// The universe instance used at a reference to `v`.
    fn instance_sort(&self, v: &Var, sig: &Signature) -> Sort {
        if !sig.is_polymorphic() {
            Sort::constant(0, 0)
        } else if self.sigma.is_staged(v) {
            Sort::POLY
        } else {
            Sort::fresh()
        }
    }

    pub fn check_type(&mut self, e: Expr) -> Result<(Term, Sort), Error> {
        let loc = e.loc();
        let (tm, ty) = self.infer(e)?;
        match self.whnf(ty, loc)? {
            Term::Univ(s) => Ok((tm, s)),
            ty if ty.spine_head().is_some() => {
                let s = Sort::fresh();
                self.unify(&ty, &Term::Univ(s.clone()), &Term::omega(), loc)?;
                Ok((tm, s))
            }
            ty => Err(Error::ExpectedUniv(ty, loc)),
        }
    }

    /// Check each parameter and bring it into scope of the current frame.
    pub fn check_tele(&mut self, tele: Tele<Expr>) -> Result<Tele<Term>, Error> {
        let mut ret = Tele::default();
        for p in tele {
            let (typ, _) = self.check_type(*p.typ)?;
            self.ctx.put(p.var.clone(), typ.clone());
            ret.push(Param::new(p.var, p.info, typ));
        }
        Ok(ret)
    }

    pub fn check(&mut self, e: Expr, ty: &Term) -> Result<(Term, Term), Error> {
        use Expr::*;

        match e {
            Lam(loc, p, b) => self.check_lam(loc, p, *b, ty),
            Tuple(loc, xs) => match self.whnf(ty.clone(), loc)? {
                Term::Sigma(tele) if tele.len() == xs.len() => {
                    let mut s = Subst::default();
                    let mut tms = Vec::default();
                    for (p, x) in tele.into_iter().zip(xs) {
                        let t = s.term(*p.typ);
                        let (x, _) = self.check(x, &t)?;
                        s.insert(p.var, x.clone());
                        tms.push(x);
                    }
                    Ok((Term::Tuple(tms), ty.clone()))
                }
                Term::Sigma(_) => Err(Error::TupleArity(loc)),
                t if t.spine_head().is_some() => self.check_by_infer(Tuple(loc, xs), ty),
                t => Err(Error::ExpectedSigma(t, loc)),
            },
            Hole(loc) => Ok((self.fresh_meta("_", ty.clone(), loc), ty.clone())),
            LitInt(loc, n) => {
                let ty = self.whnf(ty.clone(), loc)?;
                if let Term::DataCall(c) = &ty {
                    if let Some(shape) = NatShape::of(&*self.sigma, &c.def) {
                        return Ok((shape.lit(c, n), ty.clone()));
                    }
                }
                Err(Error::LitMismatch(n, ty, loc))
            }
            e => self.check_by_infer(e, ty),
        }
    }

    fn check_by_infer(&mut self, e: Expr, ty: &Term) -> Result<(Term, Term), Error> {
        let loc = e.loc();
        let (mut tm, mut actual) = self.infer(e)?;
        let expects_implicit = matches!(
            self.whnf(ty.clone(), loc)?,
            Term::Pi(p, _) if p.info == Implicit
        );
        if !expects_implicit {
            while let Term::Pi(p, b) = self.whnf(actual.clone(), loc)? {
                if p.info != Implicit {
                    break;
                }
                let m = self.fresh_meta(p.var.as_str(), *p.typ, loc);
                tm = self.normalizer(loc).apply(tm, Implicit, &[m.clone()])?;
                actual = subst(*b, &p.var, m);
            }
        }
        self.subtype(&actual, ty, loc)?;
        Ok((tm, ty.clone()))
    }

    fn check_lam(&mut self, loc: Loc, p: Param<Expr>, b: Expr, ty: &Term) -> Result<(Term, Term), Error> {
        match self.whnf(ty.clone(), loc)? {
            Term::Pi(q, cod) if q.info == p.info => {
                if !matches!(p.typ.as_ref(), Expr::Hole(_)) {
                    let (a, _) = self.check_type(*p.typ.clone())?;
                    self.unify(&a, &q.typ, &Term::omega(), loc)?;
                }
                let cod = subst(*cod, &q.var, Term::Ref(p.var.clone()));
                let body = self.scoped(|el| {
                    el.ctx.put(p.var.clone(), *q.typ.clone());
                    el.check(b, &cod)
                })?;
                let lam = Term::Lam(Param::new(p.var, q.info, *q.typ), Box::new(body.0));
                Ok((lam, ty.clone()))
            }
            Term::Pi(q, cod) if q.info == Implicit => {
                let v = q.var.copy();
                let cod = subst(*cod, &q.var, Term::Ref(v.clone()));
                let body = self.scoped(|el| {
                    el.ctx.put(v.clone(), *q.typ.clone());
                    el.check_lam(loc, p, b, &cod)
                })?;
                let lam = Term::Lam(Param::new(v, Implicit, *q.typ), Box::new(body.0));
                Ok((lam, ty.clone()))
            }
            Term::Pi(..) => Err(Error::LicitMismatch(loc)),
            ty => {
                let dom = self.fresh_type(loc);
                self.ctx.push();
                self.ctx.put(p.var.clone(), dom.clone());
                let cod = self.fresh_type(loc);
                self.ctx.pop();
                let pi = Term::Pi(Param::new(p.var.clone(), p.info, dom), Box::new(cod));
                self.unify(&pi, &ty, &Term::omega(), loc)?;
                self.check_lam(loc, p, b, &pi)
            }
        }
    }

    pub fn infer(&mut self, e: Expr) -> Result<(Term, Term), Error> {
        use Expr::*;

        match e {
            Ref(loc, v) => match self.ctx.get(&v).cloned() {
                Some(ty) => Ok((Term::Ref(v), ty)),
                None => self.def_ref(&v, loc),
            },
            Hole(loc) => {
                let ty = self.fresh_type(loc);
                Ok((self.fresh_meta("_", ty.clone(), loc), ty))
            }
            Lam(loc, p, b) => {
                let (dom, _) = match *p.typ {
                    Hole(_) => (self.fresh_type(loc), Sort::fresh()),
                    t => self.check_type(t)?,
                };
                let (body, cod) = self.scoped(|el| {
                    el.ctx.put(p.var.clone(), dom.clone());
                    el.infer(*b)
                })?;
                let param = Param::new(p.var, p.info, dom);
                Ok((
                    Term::Lam(param.clone(), Box::new(body)),
                    Term::Pi(param, Box::new(cod)),
                ))
            }
            Pi(loc, p, b) => {
                let (dom, s) = self.check_type(*p.typ)?;
                let (cod, t) = self.scoped(|el| {
                    el.ctx.put(p.var.clone(), dom.clone());
                    el.check_type(*b)
                })?;
                let sort = self.max_sort(s, t, loc)?;
                let pi = Term::Pi(Param::new(p.var, p.info, dom), Box::new(cod));
                Ok((pi, Term::Univ(sort)))
            }
            Sigma(loc, tele) => {
                let (tele, sort) = self.scoped(|el| {
                    let mut sort = Sort::constant(0, 0);
                    let mut ret = Tele::default();
                    for p in tele {
                        let (typ, s) = el.check_type(*p.typ)?;
                        sort = el.max_sort(sort, s, loc)?;
                        el.ctx.put(p.var.clone(), typ.clone());
                        ret.push(Param::new(p.var, p.info, typ));
                    }
                    Ok((ret, sort))
                })?;
                Ok((Term::Sigma(tele), Term::Univ(sort)))
            }
            Univ(_, u, h) => {
                let level = |l: UnivLevel| match l {
                    UnivLevel::Poly(n) => Level::Polymorphic(n),
                    UnivLevel::Const(n) => Level::Const(n),
                    UnivLevel::Omega => Level::Infinity,
                };
                let s = Sort {
                    u: level(u),
                    h: level(h),
                };
                let ty = Term::Univ(s.lift(1));
                Ok((Term::Univ(s), ty))
            }
            App(loc, f, info, x) => {
                let (f, fty) = self.infer(*f)?;
                self.app(loc, f, fty, info, *x)
            }
            Tuple(_, xs) => {
                let mut tms = Vec::default();
                let mut tele = Tele::default();
                for x in xs {
                    let (tm, ty) = self.infer(x)?;
                    tms.push(tm);
                    tele.push(Param::new(Var::unbound(), Explicit, ty));
                }
                Ok((Term::Tuple(tms), Term::Sigma(tele)))
            }
            Proj(loc, a, ProjIx::Index(i)) => {
                let (a, ty) = self.infer(*a)?;
                match self.whnf(ty, loc)? {
                    Term::Sigma(tele) if i >= 1 && i <= tele.len() => {
                        let mut s = Subst::default();
                        for (k, p) in tele.iter().take(i - 1).enumerate() {
                            s.insert(p.var.clone(), Term::Proj(Box::new(a.clone()), k + 1));
                        }
                        let ty = s.term(*tele[i - 1].typ.clone());
                        Ok((self.normalizer(loc).project(a, i)?, ty))
                    }
                    Term::Sigma(_) => Err(Error::ProjOutOfRange(i, loc)),
                    ty => Err(Error::ExpectedSigma(ty, loc)),
                }
            }
            Proj(loc, a, ProjIx::Field(name)) => {
                let (a, ty) = self.infer(*a)?;
                let c = match self.whnf(ty, loc)? {
                    Term::StructCall(c) => c,
                    ty => return Err(Error::ExpectedStruct(ty, loc)),
                };
                let field = self
                    .struct_fields(&c.def)
                    .into_iter()
                    .find(|f| f.name() == name)
                    .ok_or_else(|| Error::NoSuchField(name.to_string(), Term::StructCall(c.clone()), loc))?;
                let sig = self.field_sig(&field, &c, loc)?.instantiate(&a);
                let own = sig.tele;
                let access = Term::Access(Box::new(a), field, Term::refs(&own));
                Ok((Term::lam(&own, access), Term::pi(&own, sig.result)))
            }
            New(loc, s, inits) => self.new_struct(loc, *s, inits),
            LitInt(loc, n) => Err(Error::LitMismatch(n, Term::omega(), loc)),
        }
    }

    fn app(&mut self, loc: Loc, f: Term, fty: Term, info: ParamInfo, x: Expr) -> Result<(Term, Term), Error> {
        let mut f = f;
        let mut fty = fty;
        loop {
            match self.whnf(fty.clone(), loc)? {
                Term::Pi(p, b) if p.info == info => {
                    let (x, _) = self.check(x, &p.typ)?;
                    let tm = self.normalizer(loc).apply(f, info, &[x.clone()])?;
                    return Ok((tm, subst(*b, &p.var, x)));
                }
                Term::Pi(p, b) if p.info == Implicit => {
                    let m = self.fresh_meta(p.var.as_str(), *p.typ, loc);
                    f = self.normalizer(loc).apply(f, Implicit, &[m.clone()])?;
                    fty = subst(*b, &p.var, m);
                }
                Term::Pi(..) => return Err(Error::LicitMismatch(loc)),
                t if t.spine_head().is_some() => {
                    let v = Var::new("x");
                    let dom = self.fresh_type(loc);
                    self.ctx.push();
                    self.ctx.put(v.clone(), dom.clone());
                    let cod = self.fresh_type(loc);
                    self.ctx.pop();
                    let pi = Term::Pi(Param::new(v, info, dom), Box::new(cod));
                    self.unify(&t, &pi, &Term::omega(), loc)?;
                    fty = pi;
                }
                t => return Err(Error::ExpectedPi(t, loc)),
            }
        }
    }

    /// A reference to a global, as a lambda over its full signature.
    fn def_ref(&mut self, v: &Var, loc: Loc) -> Result<(Term, Term), Error> {
        let sig = self
            .sigma
            .sig(v)
            .cloned()
            .ok_or_else(|| Error::NotYetTycked(v.clone(), loc))?;
        let sort = self.instance_sort(v, &sig);
        let sig = sig.fresh(&sort);
        let tele = sig.full();
        let call = |args: Vec<Term>| Call::new(v.clone(), sort.clone(), args);
        let body = match &sig.head {
            Head::Fn => Term::FnCall(call(Term::refs(&tele))),
            Head::Data => Term::DataCall(call(Term::refs(&tele))),
            Head::Struct => Term::StructCall(call(Term::refs(&tele))),
            Head::Prim => Term::PrimCall(call(Term::refs(&tele))),
            Head::Ctor(data) => Term::ConCall(ConCall {
                data: Call::new(data.clone(), sort.clone(), Term::refs(&sig.ctx)),
                ctor: v.clone(),
                args: Term::refs(&sig.tele),
            }),
            Head::Field(_) => {
                let Some((this, own)) = sig.tele.split_first() else {
                    return Err(Error::NotYetTycked(v.clone(), loc));
                };
                Term::Access(
                    Box::new(Term::Ref(this.var.clone())),
                    v.clone(),
                    Term::refs(&own.to_vec()),
                )
            }
        };
        Ok((Term::lam(&tele, body), Term::pi(&tele, sig.result)))
    }

    pub(crate) fn struct_fields(&self, s: &Var) -> Vec<Var> {
        match self.sigma.def(s).map(|d| &d.body) {
            Some(Body::Struct(fields)) => fields.clone(),
            _ => Default::default(),
        }
    }

    /// The signature of `field` at the struct instance `c`, with the
    /// struct's parameters consumed.
    fn field_sig(&self, field: &Var, c: &Call, loc: Loc) -> Result<Signature, Error> {
        let mut sig = self
            .sigma
            .sig(field)
            .ok_or_else(|| Error::NotYetTycked(field.clone(), loc))?
            .fresh(&c.sort);
        for a in &c.args {
            sig = sig.instantiate(a);
        }
        Ok(sig)
    }

    fn new_struct(&mut self, loc: Loc, s: Expr, inits: Vec<FieldInit>) -> Result<(Term, Term), Error> {
        let (st, _) = self.check_type(s)?;
        let c = match self.whnf(st, loc)? {
            Term::StructCall(c) => c,
            ty => return Err(Error::ExpectedStruct(ty, loc)),
        };
        let mut inits = inits;
        let mut done: Vec<(Var, Term)> = Default::default();
        for f in self.struct_fields(&c.def) {
            let this = Term::New(c.clone(), done.clone());
            let sig = self.field_sig(&f, &c, loc)?.instantiate(&this);
            let ty = Term::pi(&sig.tele, sig.result);
            let value = match inits.iter().position(|i| i.name == f.name()) {
                Some(i) => {
                    let init = inits.remove(i);
                    self.check(init.value, &ty)?.0
                }
                None => match self.default_value(&f, &c) {
                    Some(d) => d,
                    None => return Err(Error::MissingField(f, loc)),
                },
            };
            done.push((f, value));
        }
        if let Some(i) = inits.into_iter().next() {
            return Err(Error::NoSuchField(i.name.to_string(), Term::StructCall(c), i.loc));
        }
        Ok((Term::New(c.clone(), done), Term::StructCall(c)))
    }

    fn default_value(&self, f: &Var, c: &Call) -> Option<Term> {
        let Body::Field(b) = &self.sigma.def(f)?.body else {
            return None;
        };
        let d = b.default.clone()?;
        let s = self.sigma.sig(&c.def)?;
        Some(Subst::tele(&s.tele, &c.args).with_sort(&c.sort).renaming().term(d))
    }
}
