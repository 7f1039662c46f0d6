use std::collections::HashMap;

use crate::theory::abs::data::{Call, Term};
use crate::theory::abs::level::Sort;
use crate::theory::{Param, Tele, Var};

pub type Rho = HashMap<Var, Term>;

/// Simultaneous substitution of locals, optionally instantiating the
/// universe parameter and freshening every binder on the way.
#[derive(Default)]
pub struct Subst {
    rho: Rho,
    sort: Option<Sort>,
    rename: bool,
}

impl Subst {
    pub fn new(rho: Rho) -> Self {
        Self {
            rho,
            ..Default::default()
        }
    }

    pub fn single(v: &Var, tm: Term) -> Self {
        Self::new(Rho::from([(v.clone(), tm)]))
    }

    /// Map each parameter of `tele` to the matching argument.
    pub fn tele(tele: &Tele<Term>, args: &[Term]) -> Self {
        Self::new(
            tele.iter()
                .zip(args)
                .map(|(p, a)| (p.var.clone(), a.clone()))
                .collect(),
        )
    }

    pub fn with_sort(mut self, sort: &Sort) -> Self {
        self.sort = Some(sort.clone());
        self
    }

    pub fn renaming(mut self) -> Self {
        self.rename = true;
        self
    }

    pub fn insert(&mut self, v: Var, tm: Term) {
        self.rho.insert(v, tm);
    }

    fn is_trivial(&self, tm: &Term) -> bool {
        if self.rename || self.sort.is_some() {
            return false;
        }
        self.rho.is_empty() || tm.free_vars().iter().all(|v| !self.rho.contains_key(v))
    }

    pub fn term(&mut self, tm: Term) -> Term {
        if self.is_trivial(&tm) {
            return tm;
        }
        self.go(tm)
    }

    pub fn params(&mut self, tele: Tele<Term>) -> Tele<Term> {
        tele.into_iter().map(|p| self.param(p)).collect()
    }

    fn param(&mut self, p: Param<Term>) -> Param<Term> {
        let typ = Box::new(self.go(*p.typ));
        let var = if self.rename {
            let v = p.var.copy();
            self.rho.insert(p.var, Term::Ref(v.clone()));
            v
        } else {
            p.var
        };
        Param {
            var,
            info: p.info,
            typ,
        }
    }

    fn sort(&self, s: Sort) -> Sort {
        match &self.sort {
            Some(to) => s.instantiate(to),
            None => s,
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
        tms.into_iter().map(|t| self.go(t)).collect()
    }

    fn go(&mut self, tm: Term) -> Term {
        use Term::*;
        match tm {
            Ref(x) => match self.rho.get(&x) {
                Some(t) => t.clone(),
                None => Ref(x),
            },
            Lam(p, b) => {
                let p = self.param(p);
                Lam(p, Box::new(self.go(*b)))
            }
            Pi(p, b) => {
                let p = self.param(p);
                Pi(p, Box::new(self.go(*b)))
            }
            Sigma(tele) => Sigma(self.params(tele)),
            Univ(s) => Univ(self.sort(s)),
            App(f, i, x) => App(Box::new(self.go(*f)), i, Box::new(self.go(*x))),
            Proj(a, ix) => Proj(Box::new(self.go(*a)), ix),
            Tuple(xs) => Tuple(self.terms(xs)),
            New(c, fields) => New(
                self.call(c),
                fields.into_iter().map(|(n, x)| (n, self.go(x))).collect(),
            ),
            FnCall(c) => FnCall(self.call(c)),
            DataCall(c) => DataCall(self.call(c)),
            StructCall(c) => StructCall(self.call(c)),
            PrimCall(c) => PrimCall(self.call(c)),
            ConCall(c) => ConCall(super::data::ConCall {
                data: self.call(c.data),
                ctor: c.ctor,
                args: self.terms(c.args),
            }),
            Access(a, n, args) => Access(Box::new(self.go(*a)), n, self.terms(args)),
            MetaCall(m, args) => MetaCall(m, self.terms(args)),
            Erroneous(a) => Erroneous(Box::new(self.go(*a))),
        }
    }
}

pub fn subst(tm: Term, v: &Var, with: Term) -> Term {
    Subst::single(v, with).term(tm)
}

/// Freshen every binder of `tm`.
pub fn rename(tm: Term) -> Term {
    Subst::default().renaming().term(tm)
}
