use std::fmt::{Display, Formatter};

use ustr::Ustr;

use crate::theory::abs::data::Term;
use crate::theory::abs::level::LevelEqns;
use crate::theory::abs::unify::Eqn;
use crate::theory::{Loc, Tele};

/// Index into a declaration's meta arena, tagged with the arena generation
/// so an id never resolves in another declaration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MetaId {
    generation: u32,
    index: u32,
}

impl Display for MetaId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "?{}", self.index)
    }
}

#[derive(Debug, Clone)]
pub struct Meta {
    pub name: Ustr,
    /// Locals in scope where the hole was created.
    pub ctx: Tele<Term>,
    pub result: Term,
    pub loc: Loc,
    solution: Option<Term>,
}

impl Meta {
    pub fn solution(&self) -> Option<&Term> {
        self.solution.as_ref()
    }
}

#[derive(Debug)]
pub struct AlreadySolved;

#[derive(Debug, Default, Clone)]
pub struct Metas {
    generation: u32,
    metas: Vec<Meta>,
}

impl Metas {
    pub fn new(generation: u32) -> Self {
        Self {
            generation,
            metas: Default::default(),
        }
    }

    pub fn fresh(&mut self, name: &str, ctx: Tele<Term>, result: Term, loc: Loc) -> MetaId {
        let index = self.metas.len() as u32;
        self.metas.push(Meta {
            name: Ustr::from(name),
            ctx,
            result,
            loc,
            solution: None,
        });
        MetaId {
            generation: self.generation,
            index,
        }
    }

    pub fn get(&self, id: MetaId) -> Option<&Meta> {
        if id.generation != self.generation {
            return None;
        }
        self.metas.get(id.index as usize)
    }

    pub fn solution(&self, id: MetaId) -> Option<&Term> {
        self.get(id).and_then(Meta::solution)
    }

    pub fn is_unsolved(&self, id: MetaId) -> bool {
        self.get(id).is_some_and(|m| m.solution.is_none())
    }

    /// Single assignment.
    pub fn solve(&mut self, id: MetaId, tm: Term) -> Result<(), AlreadySolved> {
        if id.generation != self.generation {
            return Err(AlreadySolved);
        }
        match self.metas.get_mut(id.index as usize) {
            Some(m) if m.solution.is_none() => {
                m.solution = Some(tm);
                Ok(())
            }
            _ => Err(AlreadySolved),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetaId, &Meta)> {
        let generation = self.generation;
        self.metas.iter().enumerate().map(move |(i, m)| {
            (
                MetaId {
                    generation,
                    index: i as u32,
                },
                m,
            )
        })
    }
}

/// Solver state owned by the declaration being checked.
#[derive(Debug, Default, Clone)]
pub struct TyckState {
    pub metas: Metas,
    pub levels: LevelEqns,
    pub eqns: Vec<Eqn>,
}

impl TyckState {
    pub fn new(generation: u32) -> Self {
        Self {
            metas: Metas::new(generation),
            ..Default::default()
        }
    }
}
