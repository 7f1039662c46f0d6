use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use log::debug;

use crate::theory::abs::data::Term;
use crate::theory::abs::level::Sort;
use crate::theory::abs::subst::{Rho, Subst};
use crate::theory::{Loc, Param, Syntax, Tele, Var};

#[derive(Clone, Debug)]
pub struct Def<T: Syntax> {
    pub loc: Loc,
    pub name: Var,
    pub tele: Tele<T>,
    pub ret: Box<T>,
    pub body: Body<T>,
}

impl<T: Syntax> Def<T> {
    pub fn telescope(&self) -> &Tele<T> {
        &self.tele
    }

    pub fn result(&self) -> &T {
        &self.ret
    }
}

#[derive(Clone, Debug)]
pub enum Body<T: Syntax> {
    Fn(T),
    Clauses(Vec<T::Clause>),
    Postulate,

    Data(Vec<Var>),
    Ctor(CtorBody<T>),

    Struct(Vec<Var>),
    Field(FieldBody<T>),

    Prim,
}

#[derive(Clone, Debug)]
pub struct CtorBody<T: Syntax> {
    pub data: Var,
    /// Conditions: the constructor reduces when one of these matches.
    pub clauses: Vec<T::Clause>,
}

#[derive(Clone, Debug)]
pub struct FieldBody<T: Syntax> {
    pub structure: Var,
    pub default: Option<T>,
}

impl<T: Syntax> Display for Def<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Body::*;
        let tele = Param::tele_to_string(&self.tele);
        match &self.body {
            Fn(b) => write!(f, "def {} {tele} : {} => {b}", self.name, self.ret),
            Clauses(cs) => {
                write!(f, "def {} {tele} : {}", self.name, self.ret)?;
                for c in cs {
                    write!(f, "\n  | {c}")?;
                }
                Ok(())
            }
            Postulate => write!(f, "def {} {tele} : {}", self.name, self.ret),
            Data(ctors) => {
                write!(f, "data {} {tele} : {}", self.name, self.ret)?;
                for c in ctors {
                    write!(f, " | {c}")?;
                }
                Ok(())
            }
            Ctor(c) => write!(f, "ctor {}.{} {tele}", c.data, self.name),
            Struct(fields) => {
                write!(f, "struct {} {tele} : {}", self.name, self.ret)?;
                for n in fields {
                    write!(f, " | {n}")?;
                }
                Ok(())
            }
            Field(b) => write!(f, "field {}.{} {tele} : {}", b.structure, self.name, self.ret),
            Prim => write!(f, "prim {} {tele} : {}", self.name, self.ret),
        }
    }
}

/// What a global name stands for, as far as callers are concerned.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Head {
    Fn,
    Data,
    Ctor(Var),
    Struct,
    Field(Var),
    Prim,
}

/// The type of a global definition. `ctx` is the telescope of the owning
/// data type or struct (empty for everything else); callers see it as a
/// prefix of implicit parameters. Every signature is implicitly polymorphic
/// over one universe parameter pair.
#[derive(Debug, Clone)]
pub struct Signature {
    pub head: Head,
    pub ctx: Tele<Term>,
    pub tele: Tele<Term>,
    pub result: Term,
}

impl Signature {
    pub fn new(head: Head, tele: Tele<Term>, result: Term) -> Self {
        Self {
            head,
            ctx: Default::default(),
            tele,
            result,
        }
    }

    /// `ctx ++ tele`.
    pub fn full(&self) -> Tele<Term> {
        self.ctx.iter().chain(self.tele.iter()).cloned().collect()
    }

    /// Consume the first remaining parameter with `arg`.
    pub fn instantiate(&self, arg: &Term) -> Signature {
        let mut sig = self.clone();
        let p = if sig.ctx.is_empty() {
            sig.tele.remove(0)
        } else {
            sig.ctx.remove(0)
        };
        sig.substitute(Subst::single(&p.var, arg.clone()))
    }

    pub fn substitute(self, mut s: Subst) -> Signature {
        Signature {
            head: self.head,
            ctx: s.params(self.ctx),
            tele: s.params(self.tele),
            result: s.term(self.result),
        }
    }

    /// Whether a parameter type mentions the universe parameter. Only then
    /// do call sites get their own universe instance.
    pub fn is_polymorphic(&self) -> bool {
        use Term::*;
        let mut poly = false;
        let mut check = |t: &Term| {
            poly |= match t {
                Univ(s) => s.is_polymorphic(),
                FnCall(c) | DataCall(c) | StructCall(c) | PrimCall(c) | New(c, _) => {
                    c.sort.is_polymorphic()
                }
                ConCall(c) => c.data.sort.is_polymorphic(),
                _ => false,
            }
        };
        for p in self.ctx.iter().chain(self.tele.iter()) {
            p.typ.visit(&mut check);
        }
        poly
    }

    /// Fresh binders, universe parameter replaced by `sort`.
    pub fn fresh(&self, sort: &Sort) -> Signature {
        self.clone().substitute(Subst::default().with_sort(sort).renaming())
    }
}

/// Checked definitions and the signatures of everything checked or in
/// flight. Entries of the declaration being checked are staged and either
/// committed together or rolled back.
#[derive(Debug, Default)]
pub struct Sigma {
    defs: HashMap<Var, Def<Term>>,
    sigs: HashMap<Var, Signature>,
    staged: Vec<Var>,
}

impl Sigma {
    pub fn def(&self, v: &Var) -> Option<&Def<Term>> {
        self.defs.get(v)
    }

    pub fn sig(&self, v: &Var) -> Option<&Signature> {
        self.sigs.get(v)
    }

    pub fn staged(&self) -> &[Var] {
        &self.staged
    }

    pub fn is_staged(&self, v: &Var) -> bool {
        self.staged.contains(v)
    }

    pub fn stage_sig(&mut self, v: Var, sig: Signature) {
        if !self.staged.contains(&v) {
            self.staged.push(v.clone());
        }
        self.sigs.insert(v, sig);
    }

    pub fn stage_def(&mut self, def: Def<Term>) {
        if !self.staged.contains(&def.name) {
            self.staged.push(def.name.clone());
        }
        self.defs.insert(def.name.clone(), def);
    }

    pub fn commit(&mut self) -> Vec<Var> {
        debug!("commit {} definition(s)", self.staged.len());
        std::mem::take(&mut self.staged)
    }

    pub fn rollback(&mut self) {
        debug!("rollback {} definition(s)", self.staged.len());
        for v in std::mem::take(&mut self.staged) {
            self.defs.remove(&v);
            self.sigs.remove(&v);
        }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

pub fn rho_of(tele: &Tele<Term>, args: &[Term]) -> Rho {
    tele.iter()
        .zip(args)
        .map(|(p, a)| (p.var.clone(), a.clone()))
        .collect()
}
