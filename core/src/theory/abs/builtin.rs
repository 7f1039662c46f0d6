use std::collections::HashMap;
use std::str::FromStr;

use strum::{Display, EnumString};
use ustr::Ustr;

use crate::theory::abs::data::{Call, Term};
use crate::theory::abs::level::Sort;
use crate::theory::abs::normalize::Normalizer;
use crate::theory::ParamInfo::Explicit;
use crate::theory::{Loc, Param, Tele, Var};
use crate::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, EnumString)]
pub enum PrimId {
    I,
    #[strum(serialize = "left")]
    Left,
    #[strum(serialize = "right")]
    Right,
    #[strum(serialize = "invol")]
    Invol,
}

impl PrimId {
    fn dependency(&self) -> Option<PrimId> {
        match self {
            PrimId::I => None,
            _ => Some(PrimId::I),
        }
    }

    pub fn is_endpoint(&self) -> bool {
        matches!(self, PrimId::Left | PrimId::Right)
    }
}

fn explicit(var: Var, typ: Term) -> Param<Term> {
    Param::new(var, Explicit, typ)
}

fn call(v: &Var) -> Term {
    Term::PrimCall(Call::new(v.clone(), Sort::constant(0, 0), Default::default()))
}

/// Primitives declared in one session.
#[derive(Debug, Default)]
pub struct Prims {
    defined: HashMap<PrimId, Var>,
    ids: HashMap<Var, PrimId>,
}

impl Prims {
    pub fn id_of(&self, v: &Var) -> Option<PrimId> {
        self.ids.get(v).copied()
    }

    pub fn var(&self, id: PrimId) -> Option<&Var> {
        self.defined.get(&id)
    }

    /// Look up the factory for `name` and build the expected type of a new
    /// primitive declared as `var`.
    pub fn factory(&self, var: &Var, loc: Loc) -> Result<(PrimId, Tele<Term>, Term), Error> {
        let name = var.name();
        let id = PrimId::from_str(name.as_str()).map_err(|_| Error::UnknownPrim(name, loc))?;
        if self.defined.contains_key(&id) {
            return Err(Error::RedefinedPrim(name, loc));
        }
        let interval = match id.dependency() {
            Some(dep) => match self.defined.get(&dep) {
                Some(i) => Some(call(i)),
                None => return Err(Error::PrimDependency(name, Ustr::from(&dep.to_string()), loc)),
            },
            None => None,
        };
        Ok(match (id, interval) {
            (PrimId::I, _) => (id, Default::default(), Term::Univ(Sort::constant(0, 0))),
            (PrimId::Left | PrimId::Right, Some(i)) => (id, Default::default(), i),
            (PrimId::Invol, Some(i)) => (id, vec![explicit(Var::new("i"), i.clone())], i),
            (_, None) => return Err(Error::PrimDependency(name, Ustr::from("I"), loc)),
        })
    }

    pub fn declare(&mut self, id: PrimId, var: Var) {
        self.ids.insert(var.clone(), id);
        self.defined.insert(id, var);
    }

    /// The two endpoints of the interval, once both are declared.
    pub fn endpoints(&self) -> Option<(Var, Var)> {
        let l = self.defined.get(&PrimId::Left)?;
        let r = self.defined.get(&PrimId::Right)?;
        Some((l.clone(), r.clone()))
    }

    pub fn is_interval(&self, tm: &Term) -> bool {
        match (tm, self.defined.get(&PrimId::I)) {
            (Term::PrimCall(c), Some(i)) => &c.def == i,
            _ => false,
        }
    }

    pub fn unfold(&self, c: &Call, n: &Normalizer) -> Result<Option<Term>, Error> {
        match self.id_of(&c.def) {
            Some(PrimId::Invol) => {
                let Some(arg) = c.args.first() else {
                    return Ok(None);
                };
                let (Some(l), Some(r)) = (self.var(PrimId::Left), self.var(PrimId::Right)) else {
                    return Ok(None);
                };
                Ok(match n.whnf(arg.clone())? {
                    Term::PrimCall(x) if &x.def == l => Some(call(r)),
                    Term::PrimCall(x) if &x.def == r => Some(call(l)),
                    _ => None,
                })
            }
            _ => Ok(None),
        }
    }
}
