use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::theory::abs::level::Sort;
use crate::theory::abs::meta::MetaId;
use crate::theory::abs::pat::Matching;
use crate::theory::ParamInfo::Explicit;
use crate::theory::{Param, ParamInfo, Syntax, Tele, Var};

/// A call to a global definition, referenced by handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub def: Var,
    pub sort: Sort,
    pub args: Vec<Term>,
}

impl Call {
    pub fn new(def: Var, sort: Sort, args: Vec<Term>) -> Self {
        Self { def, sort, args }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConCall {
    /// The data type, applied to its own arguments.
    pub data: Call,
    pub ctor: Var,
    pub args: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Ref(Var),
    Lam(Param<Self>, Box<Self>),
    Pi(Param<Self>, Box<Self>),
    /// The last entry is the type of the final component.
    Sigma(Tele<Self>),
    Univ(Sort),
    App(Box<Self>, ParamInfo, Box<Self>),
    /// 1-based.
    Proj(Box<Self>, usize),
    Tuple(Vec<Self>),
    New(Call, Vec<(Var, Self)>),

    FnCall(Call),
    DataCall(Call),
    ConCall(ConCall),
    StructCall(Call),
    PrimCall(Call),
    /// Field access with the field's own arguments.
    Access(Box<Self>, Var, Vec<Self>),

    MetaCall(MetaId, Vec<Self>),
    Erroneous(Box<Self>),
}

impl Syntax for Term {
    type Clause = Matching;
}

impl Term {
    pub fn lam(tele: &Tele<Term>, tm: Term) -> Term {
        tele.iter()
            .rfold(tm, |b, p| Term::Lam(p.clone(), Box::new(b)))
    }

    pub fn pi(tele: &Tele<Term>, tm: Term) -> Term {
        tele.iter()
            .rfold(tm, |b, p| Term::Pi(p.clone(), Box::new(b)))
    }

    pub fn refs(tele: &Tele<Term>) -> Vec<Term> {
        tele.iter().map(|p| Term::Ref(p.var.clone())).collect()
    }

    pub fn omega() -> Term {
        Term::Univ(Sort::OMEGA)
    }

    /// The hole at the head of an application spine, if any.
    pub fn spine_head(&self) -> Option<MetaId> {
        match self {
            Term::MetaCall(m, _) => Some(*m),
            Term::App(f, _, _) => f.spine_head(),
            _ => None,
        }
    }

    /// Split `f a b c` into `f` and `[a, b, c]`.
    pub fn unapply(&self) -> (&Term, Vec<&Term>) {
        let mut args = Vec::default();
        let mut tm = self;
        while let Term::App(f, _, x) = tm {
            args.push(x.as_ref());
            tm = f;
        }
        args.reverse();
        (tm, args)
    }

    pub fn free_vars(&self) -> HashSet<Var> {
        let mut fv = FreeVars::default();
        fv.term(self);
        fv.free
    }

    pub fn mentions(&self, v: &Var) -> bool {
        self.free_vars().contains(v)
    }

    pub fn mentions_meta(&self, m: MetaId) -> bool {
        let mut found = false;
        self.visit(&mut |t| {
            if let Term::MetaCall(n, _) = t {
                found |= *n == m;
            }
        });
        found
    }

    /// Pre-order traversal over every subterm.
    pub fn visit(&self, f: &mut impl FnMut(&Term)) {
        use Term::*;
        f(self);
        match self {
            Ref(_) | Univ(_) => {}
            Lam(p, b) | Pi(p, b) => {
                p.typ.visit(f);
                b.visit(f);
            }
            Sigma(tele) => tele.iter().for_each(|p| p.typ.visit(f)),
            App(a, _, b) => {
                a.visit(f);
                b.visit(f);
            }
            Proj(a, _) | Erroneous(a) => a.visit(f),
            Tuple(xs) | MetaCall(_, xs) => xs.iter().for_each(|x| x.visit(f)),
            New(c, fields) => {
                c.args.iter().for_each(|x| x.visit(f));
                fields.iter().for_each(|(_, x)| x.visit(f));
            }
            FnCall(c) | DataCall(c) | StructCall(c) | PrimCall(c) => {
                c.args.iter().for_each(|x| x.visit(f))
            }
            ConCall(c) => {
                c.data.args.iter().for_each(|x| x.visit(f));
                c.args.iter().for_each(|x| x.visit(f));
            }
            Access(a, _, args) => {
                a.visit(f);
                args.iter().for_each(|x| x.visit(f));
            }
        }
    }

    fn is_atom(&self) -> bool {
        use Term::*;
        match self {
            Ref(_) | Univ(_) | Tuple(_) | Proj(..) | MetaCall(..) | Erroneous(_) => true,
            FnCall(c) | DataCall(c) | StructCall(c) | PrimCall(c) => c.args.is_empty(),
            ConCall(c) => c.args.is_empty(),
            Access(_, _, args) => args.is_empty(),
            _ => false,
        }
    }
}

#[derive(Default)]
struct FreeVars {
    bound: Vec<Var>,
    free: HashSet<Var>,
}

impl FreeVars {
    fn term(&mut self, tm: &Term) {
        use Term::*;
        match tm {
            Ref(v) => {
                if !self.bound.contains(v) {
                    self.free.insert(v.clone());
                }
            }
            Lam(p, b) | Pi(p, b) => {
                self.term(&p.typ);
                self.bound.push(p.var.clone());
                self.term(b);
                self.bound.pop();
            }
            Sigma(tele) => {
                for p in tele {
                    self.term(&p.typ);
                    self.bound.push(p.var.clone());
                }
                self.bound.truncate(self.bound.len() - tele.len());
            }
            Univ(_) => {}
            App(a, _, b) => {
                self.term(a);
                self.term(b);
            }
            Proj(a, _) | Erroneous(a) => self.term(a),
            Tuple(xs) | MetaCall(_, xs) => xs.iter().for_each(|x| self.term(x)),
            New(c, fields) => {
                c.args.iter().for_each(|x| self.term(x));
                fields.iter().for_each(|(_, x)| self.term(x));
            }
            FnCall(c) | DataCall(c) | StructCall(c) | PrimCall(c) => {
                c.args.iter().for_each(|x| self.term(x))
            }
            ConCall(c) => {
                c.data.args.iter().for_each(|x| self.term(x));
                c.args.iter().for_each(|x| self.term(x));
            }
            Access(a, _, args) => {
                self.term(a);
                args.iter().for_each(|x| self.term(x));
            }
        }
    }
}

struct Atom<'a>(&'a Term);

impl Display for Atom<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_atom() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "({})", self.0)
        }
    }
}

fn write_call(f: &mut Formatter<'_>, head: &Var, args: &[Term]) -> std::fmt::Result {
    write!(f, "{head}")?;
    for a in args {
        write!(f, " {}", Atom(a))?;
    }
    Ok(())
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Term::*;
        match self {
            Ref(v) => write!(f, "{v}"),
            Lam(p, b) => write!(f, "\\{p} => {b}"),
            Pi(p, b) if p.info == Explicit && !b.mentions(&p.var) => {
                write!(f, "{} -> {b}", Atom(&p.typ))
            }
            Pi(p, b) => write!(f, "Pi {p} -> {b}"),
            Sigma(tele) => match tele.split_last() {
                Some((last, init)) => {
                    write!(f, "Sig {} ** {}", Param::tele_to_string(&init.to_vec()), last.typ)
                }
                None => f.write_str("Sig"),
            },
            Univ(s) => write!(f, "Type{s}"),
            App(a, info, b) => match info {
                ParamInfo::Explicit => write!(f, "{a} {}", Atom(b)),
                ParamInfo::Implicit => write!(f, "{a} {{{b}}}"),
            },
            Proj(a, ix) => write!(f, "{}.{ix}", Atom(a)),
            Tuple(xs) => write!(
                f,
                "({})",
                xs.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", ")
            ),
            New(c, fields) => {
                write!(f, "new ")?;
                write_call(f, &c.def, &c.args)?;
                write!(f, " {{")?;
                for (n, x) in fields {
                    write!(f, " | {n} => {x}")?;
                }
                write!(f, " }}")
            }
            FnCall(c) | DataCall(c) | StructCall(c) | PrimCall(c) => write_call(f, &c.def, &c.args),
            ConCall(c) => write_call(f, &c.ctor, &c.args),
            Access(a, n, args) => {
                write!(f, "{}.{n}", Atom(a))?;
                for x in args {
                    write!(f, " {}", Atom(x))?;
                }
                Ok(())
            }
            MetaCall(m, args) => {
                write!(f, "{m}")?;
                if !args.is_empty() {
                    let args = args.iter().map(|x| x.to_string()).collect::<Vec<_>>();
                    write!(f, "[{}]", args.join(", "))?;
                }
                Ok(())
            }
            Erroneous(t) => write!(f, "{{?{t}?}}"),
        }
    }
}
