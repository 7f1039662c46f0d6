use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use log::trace;
use ustr::Ustr;
use uuid::Uuid;

use crate::theory::abs::unify::Ordering;
use crate::theory::Loc;
use crate::Error;

/// A flexible level variable, solved at the end of its declaration.
#[derive(Clone, Eq)]
pub struct LvlVar {
    id: Uuid,
    name: Ustr,
}

impl LvlVar {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: Ustr::from(name),
        }
    }
}

impl PartialEq for LvlVar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for LvlVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl Debug for LvlVar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = self.id.simple().to_string();
        write!(f, "{}#{}", self.name, &id[..6])
    }
}

impl Display for LvlVar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Level {
    Const(u32),
    Ref(LvlVar, u32),
    /// The enclosing definition's own level parameter, lifted.
    Polymorphic(u32),
    Infinity,
}

impl Level {
    pub fn lift(&self, n: u32) -> Self {
        use Level::*;
        match self {
            Const(k) => Const(k + n),
            Ref(v, k) => Ref(v.clone(), k + n),
            Polymorphic(k) => Polymorphic(k + n),
            Infinity => Infinity,
        }
    }

    /// Replace the polymorphic parameter by `to`.
    pub fn instantiate(&self, to: &Level) -> Self {
        match self {
            Level::Polymorphic(k) => to.lift(*k),
            l => l.clone(),
        }
    }

    fn fmt_with(&self, f: &mut Formatter<'_>, param: &str) -> std::fmt::Result {
        use Level::*;
        match self {
            Const(k) => write!(f, "{k}"),
            Ref(v, 0) => write!(f, "{v}"),
            Ref(v, k) => write!(f, "{v}+{k}"),
            Polymorphic(0) => f.write_str(param),
            Polymorphic(k) => write!(f, "{param}+{k}"),
            Infinity => f.write_str("oo"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Sort {
    pub u: Level,
    pub h: Level,
}

impl Sort {
    pub const OMEGA: Sort = Sort {
        u: Level::Infinity,
        h: Level::Infinity,
    };

    /// The definition's own universe, `Type \lp \lh`.
    pub const POLY: Sort = Sort {
        u: Level::Polymorphic(0),
        h: Level::Polymorphic(0),
    };

    pub fn constant(u: u32, h: u32) -> Self {
        Self {
            u: Level::Const(u),
            h: Level::Const(h),
        }
    }

    pub fn fresh() -> Self {
        Self {
            u: Level::Ref(LvlVar::new("u"), 0),
            h: Level::Ref(LvlVar::new("h"), 0),
        }
    }

    pub fn is_polymorphic(&self) -> bool {
        matches!(self.u, Level::Polymorphic(_)) || matches!(self.h, Level::Polymorphic(_))
    }

    pub fn lift(&self, n: u32) -> Self {
        Self {
            u: self.u.lift(n),
            h: self.h.lift(n),
        }
    }

    pub fn instantiate(&self, to: &Sort) -> Self {
        Self {
            u: self.u.instantiate(&to.u),
            h: self.h.instantiate(&to.h),
        }
    }

    /// The least upper bound, when it can be computed without constraints.
    pub fn max(&self, other: &Sort) -> Option<Sort> {
        Some(Sort {
            u: max_level(&self.u, &other.u)?,
            h: max_level(&self.h, &other.h)?,
        })
    }
}

fn max_level(a: &Level, b: &Level) -> Option<Level> {
    use Level::*;
    match (a, b) {
        (a, b) if a == b => Some(a.clone()),
        (Infinity, _) | (_, Infinity) => Some(Infinity),
        (Const(x), Const(y)) => Some(Const(*x.max(y))),
        (Polymorphic(x), Polymorphic(y)) => Some(Polymorphic(*x.max(y))),
        (Polymorphic(x), Const(y)) | (Const(y), Polymorphic(x)) if y <= x => Some(Polymorphic(*x)),
        _ => None,
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        self.u.fmt_with(f, "lp")?;
        f.write_str(", ")?;
        self.h.fmt_with(f, "lh")?;
        f.write_str(")")
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Decision {
    Yes,
    No,
    Maybe,
}

impl From<bool> for Decision {
    fn from(b: bool) -> Self {
        if b {
            Decision::Yes
        } else {
            Decision::No
        }
    }
}

fn cmp_const(cmp: Ordering, l: u32, r: u32) -> bool {
    match cmp {
        Ordering::Lt => l <= r,
        Ordering::Eq => l == r,
        Ordering::Gt => l >= r,
    }
}

/// Decide `lhs cmp rhs` right away when the answer cannot depend on a
/// flexible variable.
fn biased_eq(cmp: Ordering, lhs: &Level, rhs: &Level) -> Decision {
    use Level::*;
    match (lhs, rhs) {
        (l, r) if l == r => Decision::Yes,
        (Const(_), Infinity) | (Polymorphic(_), Infinity) => (cmp == Ordering::Lt).into(),
        (Infinity, Const(_)) | (Infinity, Polymorphic(_)) => (cmp == Ordering::Gt).into(),
        (Const(l), Const(r)) | (Polymorphic(l), Polymorphic(r)) => cmp_const(cmp, *l, *r).into(),
        // `\lp + l` against a constant: the parameter may be arbitrarily large.
        (Polymorphic(l), Const(r)) => match cmp {
            Ordering::Gt => (l >= r).into(),
            _ => Decision::No,
        },
        (Const(l), Polymorphic(r)) => match cmp {
            Ordering::Lt => (l <= r).into(),
            _ => Decision::No,
        },
        _ => Decision::Maybe,
    }
}

/// `lhs <= rhs` on one level axis.
#[derive(Debug, Clone)]
struct Leq {
    lhs: Level,
    rhs: Level,
    loc: Loc,
}

#[derive(Debug, Clone)]
pub struct LevelEqn {
    pub lhs: Sort,
    pub rhs: Sort,
    pub cmp: Ordering,
    pub loc: Loc,
}

/// Deferred level equations of one declaration.
#[derive(Debug, Default, Clone)]
pub struct LevelEqns {
    eqns: Vec<LevelEqn>,
    u: Vec<Leq>,
    h: Vec<Leq>,
}

impl LevelEqns {
    pub fn add(&mut self, lhs: &Sort, rhs: &Sort, cmp: Ordering, loc: Loc) -> Result<(), Error> {
        let eqn = LevelEqn {
            lhs: lhs.clone(),
            rhs: rhs.clone(),
            cmp,
            loc,
        };
        let mut deferred = false;
        for (l, r, axis) in [(&lhs.u, &rhs.u, 0), (&lhs.h, &rhs.h, 1)] {
            match biased_eq(cmp, l, r) {
                Decision::Yes => {}
                Decision::No => return Err(Error::LevelMismatch(lhs.clone(), rhs.clone(), loc)),
                Decision::Maybe => {
                    deferred = true;
                    let set = if axis == 0 { &mut self.u } else { &mut self.h };
                    Self::push(set, l, r, cmp, loc);
                }
            }
        }
        if deferred {
            trace!("deferred level equation {lhs} {cmp} {rhs}");
            self.eqns.push(eqn);
        }
        Ok(())
    }

    fn push(set: &mut Vec<Leq>, l: &Level, r: &Level, cmp: Ordering, loc: Loc) {
        let leq = |lhs: &Level, rhs: &Level| Leq {
            lhs: lhs.clone(),
            rhs: rhs.clone(),
            loc,
        };
        match cmp {
            Ordering::Lt => set.push(leq(l, r)),
            Ordering::Gt => set.push(leq(r, l)),
            Ordering::Eq => {
                set.push(leq(l, r));
                set.push(leq(r, l));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.eqns.is_empty()
    }

    /// Least solution of the deferred equations. Variables that take part in
    /// no equation stay unsolved.
    pub fn solve(&self) -> Result<LevelSubst, Error> {
        let mut subst = LevelSubst::default();
        for set in [&self.u, &self.h] {
            for (v, b) in least_solution(set, &self.eqns)? {
                trace!("solved level {v:?} := {:?}", b.to_level());
                subst.0.insert(v, b.to_level());
            }
        }
        Ok(subst)
    }
}

/// `max(konst, \lp + poly)`, or infinity.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct Bound {
    konst: u32,
    poly: Option<u32>,
    inf: bool,
}

impl Bound {
    const ZERO: Bound = Bound {
        konst: 0,
        poly: None,
        inf: false,
    };

    const INF: Bound = Bound {
        konst: 0,
        poly: None,
        inf: true,
    };

    fn join(self, other: Bound) -> Bound {
        if self.inf || other.inf {
            return Self::INF;
        }
        Bound {
            konst: self.konst.max(other.konst),
            poly: match (self.poly, other.poly) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
            inf: false,
        }
    }

    fn lift(self, k: u32) -> Bound {
        Bound {
            konst: self.konst + k,
            poly: self.poly.map(|p| p + k),
            inf: self.inf,
        }
    }

    fn lower(self, k: u32) -> Bound {
        Bound {
            konst: self.konst.saturating_sub(k),
            poly: self.poly.map(|p| p.saturating_sub(k)),
            inf: self.inf,
        }
    }

    /// Holds for every value of the polymorphic parameter.
    fn le(self, other: Bound) -> bool {
        if other.inf {
            return true;
        }
        if self.inf {
            return false;
        }
        let konst_ok = self.konst <= other.konst || other.poly.is_some_and(|p| self.konst <= p);
        let poly_ok = match (self.poly, other.poly) {
            (None, _) => true,
            (Some(a), Some(b)) => a <= b,
            (Some(_), None) => false,
        };
        konst_ok && poly_ok
    }

    fn to_level(self) -> Level {
        if self.inf {
            return Level::Infinity;
        }
        match self.poly {
            None => Level::Const(self.konst),
            Some(p) => Level::Polymorphic(p.max(self.konst)),
        }
    }
}

fn eval(l: &Level, val: &HashMap<LvlVar, Bound>) -> Bound {
    match l {
        Level::Const(k) => Bound {
            konst: *k,
            ..Bound::ZERO
        },
        Level::Polymorphic(k) => Bound {
            poly: Some(*k),
            ..Bound::ZERO
        },
        Level::Infinity => Bound::INF,
        Level::Ref(v, k) => val.get(v).copied().unwrap_or(Bound::ZERO).lift(*k),
    }
}

fn least_solution(set: &[Leq], eqns: &[LevelEqn]) -> Result<HashMap<LvlVar, Bound>, Error> {
    let mismatch = |loc: Loc| match eqns.iter().find(|e| e.loc == loc) {
        Some(e) => Error::LevelMismatch(e.lhs.clone(), e.rhs.clone(), e.loc),
        None => Error::LevelMismatch(Sort::OMEGA, Sort::constant(0, 0), loc),
    };

    let mut val = HashMap::<LvlVar, Bound>::default();
    for leq in set {
        for l in [&leq.lhs, &leq.rhs] {
            if let Level::Ref(v, _) = l {
                val.entry(v.clone()).or_insert(Bound::ZERO);
            }
        }
    }

    let rounds = val.len() + 1;
    let mut stable = false;
    for _ in 0..=rounds {
        let mut changed = false;
        for leq in set {
            if let Level::Ref(v, k) = &leq.rhs {
                let need = eval(&leq.lhs, &val).lower(*k);
                let old = val[v];
                let new = old.join(need);
                if new != old {
                    val.insert(v.clone(), new);
                    changed = true;
                }
            }
        }
        if !changed {
            stable = true;
            break;
        }
    }
    if !stable {
        let loc = set.first().map(|l| l.loc).unwrap_or_default();
        return Err(mismatch(loc));
    }

    for leq in set {
        if !eval(&leq.lhs, &val).le(eval(&leq.rhs, &val)) {
            return Err(mismatch(leq.loc));
        }
    }
    Ok(val)
}

#[derive(Debug, Default, Clone)]
pub struct LevelSubst(HashMap<LvlVar, Level>);

impl LevelSubst {
    /// `None` when `l` mentions a variable with no solution.
    pub fn level(&self, l: &Level) -> Option<Level> {
        match l {
            Level::Ref(v, k) => self.0.get(v).map(|s| s.lift(*k)),
            l => Some(l.clone()),
        }
    }

    pub fn sort(&self, s: &Sort) -> Result<Sort, LvlVar> {
        let level = |l: &Level| {
            self.level(l).ok_or_else(|| match l {
                Level::Ref(v, _) => v.clone(),
                _ => unreachable!(),
            })
        };
        Ok(Sort {
            u: level(&s.u)?,
            h: level(&s.h)?,
        })
    }
}
