use crate::theory::abs::data::Term;
use crate::theory::ParamInfo::Explicit;
use crate::theory::{Param, Tele, Var};

/// Local variables in scope, as a stack of frames.
#[derive(Debug, Default)]
pub struct LocalCtx {
    frames: Vec<Vec<(Var, Term)>>,
}

impl LocalCtx {
    pub fn push(&mut self) {
        self.frames.push(Default::default());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn put(&mut self, v: Var, typ: Term) {
        if self.frames.is_empty() {
            self.push();
        }
        if let Some(f) = self.frames.last_mut() {
            f.push((v, typ));
        }
    }

    pub fn get(&self, v: &Var) -> Option<&Term> {
        self.frames
            .iter()
            .rev()
            .flat_map(|f| f.iter().rev())
            .find(|(x, _)| x == v)
            .map(|(_, t)| t)
    }

    pub fn contains(&self, v: &Var) -> bool {
        self.get(v).is_some()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Every local in scope, outermost first.
    pub fn extract(&self) -> Tele<Term> {
        self.frames
            .iter()
            .flatten()
            .map(|(v, t)| Param::new(v.clone(), Explicit, t.clone()))
            .collect()
    }
}
