use std::fmt::{Display, Formatter};

use crate::theory::abs::data::{Call, ConCall, Term};
use crate::theory::abs::def::{Body, Sigma};
use crate::theory::abs::level::Sort;
use crate::theory::abs::normalize::Normalizer;
use crate::theory::abs::subst::{Rho, Subst};
use crate::theory::{Loc, Var};
use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct CtorPat {
    /// The matched data type, applied to its arguments.
    pub data: Call,
    pub ctor: Var,
    pub args: Vec<Pat>,
    pub as_bind: Option<Var>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pat {
    Bind(Var),
    Absurd,
    /// A numeric literal of a Nat-shaped data type.
    Lit(u64, Call),
    Tuple(Vec<Pat>, Option<Var>),
    Ctor(CtorPat),
    /// An endpoint of a primitive type, e.g. `left`.
    Prim(Var),
}

impl Pat {
    pub fn to_term(&self, sigma: &Sigma) -> Term {
        use Pat::*;
        match self {
            Bind(v) => Term::Ref(v.clone()),
            Absurd => Term::Erroneous(Box::new(Term::omega())),
            Lit(n, data) => match NatShape::of(sigma, &data.def) {
                Some(shape) => shape.lit(data, *n),
                None => Term::Erroneous(Box::new(Term::DataCall(data.clone()))),
            },
            Tuple(ps, _) => Term::Tuple(ps.iter().map(|p| p.to_term(sigma)).collect()),
            Ctor(c) => Term::ConCall(ConCall {
                data: c.data.clone(),
                ctor: c.ctor.clone(),
                args: c.args.iter().map(|p| p.to_term(sigma)).collect(),
            }),
            Prim(v) => Term::PrimCall(Call::new(v.clone(), Sort::constant(0, 0), Default::default())),
        }
    }

    /// Variables bound anywhere in this pattern, as-bindings included.
    pub fn binds(&self) -> Vec<Var> {
        let mut ret = Vec::default();
        self.collect_binds(&mut ret);
        ret
    }

    fn collect_binds(&self, out: &mut Vec<Var>) {
        use Pat::*;
        match self {
            Bind(v) => out.push(v.clone()),
            Absurd | Lit(..) | Prim(_) => {}
            Tuple(ps, as_bind) => {
                ps.iter().for_each(|p| p.collect_binds(out));
                out.extend(as_bind.iter().cloned());
            }
            Ctor(c) => {
                c.args.iter().for_each(|p| p.collect_binds(out));
                out.extend(c.as_bind.iter().cloned());
            }
        }
    }

    pub fn is_absurd(&self) -> bool {
        use Pat::*;
        match self {
            Absurd => true,
            Tuple(ps, _) => ps.iter().any(Pat::is_absurd),
            Ctor(c) => c.args.iter().any(Pat::is_absurd),
            _ => false,
        }
    }

    /// Whether every term matching `other` also matches `self`.
    pub fn subsumes(&self, other: &Pat, sigma: &Sigma) -> bool {
        use Pat::*;
        match (self, other) {
            (Bind(_), _) => true,
            (Lit(..), _) => self
                .unfold_lit(sigma)
                .is_some_and(|p| p.subsumes(other, sigma)),
            (_, Lit(..)) => other
                .unfold_lit(sigma)
                .is_some_and(|q| self.subsumes(&q, sigma)),
            (Ctor(a), Ctor(b)) => a.ctor == b.ctor && Pat::all_subsume(&a.args, &b.args, sigma),
            (Tuple(ps, _), Tuple(qs, _)) => Pat::all_subsume(ps, qs, sigma),
            (Prim(a), Prim(b)) => a == b,
            (Absurd, Absurd) => true,
            _ => false,
        }
    }

    pub fn all_subsume(ps: &[Pat], qs: &[Pat], sigma: &Sigma) -> bool {
        ps.len() == qs.len() && ps.iter().zip(qs).all(|(p, q)| p.subsumes(q, sigma))
    }

    /// Peel one constructor off a literal pattern.
    pub fn unfold_lit(&self, sigma: &Sigma) -> Option<Pat> {
        match self {
            Pat::Lit(n, data) => {
                let shape = NatShape::of(sigma, &data.def)?;
                Some(match n {
                    0 => Pat::Ctor(CtorPat {
                        data: data.clone(),
                        ctor: shape.zero,
                        args: Default::default(),
                        as_bind: None,
                    }),
                    n => Pat::Ctor(CtorPat {
                        data: data.clone(),
                        ctor: shape.suc,
                        args: vec![Pat::Lit(n - 1, data.clone())],
                        as_bind: None,
                    }),
                })
            }
            _ => None,
        }
    }
}

impl Display for Pat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Pat::*;
        match self {
            Bind(v) => write!(f, "{v}"),
            Absurd => f.write_str("()"),
            Lit(n, _) => write!(f, "{n}"),
            Tuple(ps, _) => write!(
                f,
                "({})",
                ps.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
            ),
            Ctor(c) if c.args.is_empty() => write!(f, "{}", c.ctor),
            Ctor(c) => {
                write!(f, "({}", c.ctor)?;
                for a in &c.args {
                    write!(f, " {a}")?;
                }
                f.write_str(")")
            }
            Prim(v) => write!(f, "{v}"),
        }
    }
}

/// A checked clause. Absurd clauses have no body.
#[derive(Debug, Clone, PartialEq)]
pub struct Matching {
    pub loc: Loc,
    pub pats: Vec<Pat>,
    pub body: Option<Term>,
}

impl Display for Matching {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let pats = self
            .pats
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match &self.body {
            Some(b) => write!(f, "{pats} => {b}"),
            None => f.write_str(&pats),
        }
    }
}

/// Data types with one nullary and one unary self-recursive constructor,
/// which numeric literals elaborate into.
#[derive(Debug, Clone)]
pub struct NatShape {
    pub zero: Var,
    pub suc: Var,
}

impl NatShape {
    pub fn of(sigma: &Sigma, data: &Var) -> Option<Self> {
        let def = sigma.def(data)?;
        let Body::Data(ctors) = &def.body else {
            return None;
        };
        if ctors.len() != 2 || !def.tele.is_empty() {
            return None;
        }
        let mut zero = None;
        let mut suc = None;
        for c in ctors {
            let sig = sigma.sig(c)?;
            match sig.tele.as_slice() {
                [] => zero = Some(c.clone()),
                [p] if matches!(p.typ.as_ref(), Term::DataCall(d) if &d.def == data) => {
                    suc = Some(c.clone())
                }
                _ => return None,
            }
        }
        Some(Self {
            zero: zero?,
            suc: suc?,
        })
    }

    pub fn lit(&self, data: &Call, n: u64) -> Term {
        let mut tm = Term::ConCall(ConCall {
            data: data.clone(),
            ctor: self.zero.clone(),
            args: Default::default(),
        });
        for _ in 0..n {
            tm = Term::ConCall(ConCall {
                data: data.clone(),
                ctor: self.suc.clone(),
                args: vec![tm],
            });
        }
        tm
    }
}

impl<'a> Normalizer<'a> {
    /// `Ok(false)` is a plain mismatch, including a stuck argument against a
    /// constructor pattern.
    pub fn match_pat(&self, pat: &Pat, tm: Term, rho: &mut Rho) -> Result<bool, Error> {
        use Pat::*;
        match pat {
            Bind(v) => {
                rho.insert(v.clone(), tm);
                Ok(true)
            }
            Absurd => Ok(false),
            Lit(..) => match pat.unfold_lit(self.sigma()) {
                Some(p) => self.match_pat(&p, tm, rho),
                None => Ok(false),
            },
            Tuple(ps, as_bind) => {
                let tm = self.whnf(tm)?;
                if let Some(v) = as_bind {
                    rho.insert(v.clone(), tm.clone());
                }
                let xs = match tm {
                    Term::Tuple(xs) if xs.len() == ps.len() => xs,
                    Term::Tuple(_) => return Ok(false),
                    tm => (1..=ps.len())
                        .map(|i| Term::Proj(Box::new(tm.clone()), i))
                        .collect(),
                };
                self.match_pats(ps, xs, rho)
            }
            Ctor(c) => match self.whnf(tm)? {
                Term::ConCall(x) if x.ctor == c.ctor => {
                    if let Some(v) = &c.as_bind {
                        rho.insert(v.clone(), Term::ConCall(x.clone()));
                    }
                    self.match_pats(&c.args, x.args, rho)
                }
                _ => Ok(false),
            },
            Prim(v) => Ok(matches!(self.whnf(tm)?, Term::PrimCall(c) if &c.def == v)),
        }
    }

    pub fn match_pats(&self, pats: &[Pat], tms: Vec<Term>, rho: &mut Rho) -> Result<bool, Error> {
        if pats.len() != tms.len() {
            return Ok(false);
        }
        for (p, tm) in pats.iter().zip(tms) {
            if !self.match_pat(p, tm, rho)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The body of the first clause whose patterns all match `args`.
    pub fn match_clauses(
        &self,
        clauses: &[Matching],
        args: &[Term],
        sort: &Sort,
    ) -> Result<Option<Term>, Error> {
        for m in clauses {
            let Some(body) = &m.body else {
                continue;
            };
            let mut rho = Rho::default();
            if self.match_pats(&m.pats, args.to_vec(), &mut rho)? {
                let body = Subst::new(rho).with_sort(sort).renaming().term(body.clone());
                return Ok(Some(body));
            }
        }
        Ok(None)
    }
}
