use std::fmt::{Display, Formatter};

use ustr::Ustr;

use crate::theory::{Loc, Param, ParamInfo, Syntax, Tele, Var};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UnivLevel {
    /// The definition's own level parameter, lifted.
    Poly(u32),
    Const(u32),
    Omega,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ProjIx {
    /// 1-based.
    Index(usize),
    Field(Ustr),
}

#[derive(Debug, Clone)]
pub struct FieldInit {
    pub loc: Loc,
    pub name: Ustr,
    pub value: Expr,
}

/// Scope-resolved surface expressions.
#[derive(Debug, Clone)]
pub enum Expr {
    Ref(Loc, Var),
    Hole(Loc),

    Lam(Loc, Param<Self>, Box<Self>),
    Pi(Loc, Param<Self>, Box<Self>),
    App(Loc, Box<Self>, ParamInfo, Box<Self>),

    Sigma(Loc, Tele<Self>),
    Tuple(Loc, Vec<Self>),
    Proj(Loc, Box<Self>, ProjIx),

    New(Loc, Box<Self>, Vec<FieldInit>),

    Univ(Loc, UnivLevel, UnivLevel),
    LitInt(Loc, u64),
}

impl Expr {
    pub fn loc(&self) -> Loc {
        use Expr::*;
        match self {
            Ref(loc, _)
            | Hole(loc)
            | Lam(loc, ..)
            | Pi(loc, ..)
            | App(loc, ..)
            | Sigma(loc, _)
            | Tuple(loc, _)
            | Proj(loc, ..)
            | New(loc, ..)
            | Univ(loc, ..)
            | LitInt(loc, _) => *loc,
        }
    }
}

impl Syntax for Expr {
    type Clause = Clause;
}

impl Display for UnivLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UnivLevel::Poly(0) => f.write_str("lp"),
            UnivLevel::Poly(n) => write!(f, "(lp+{n})"),
            UnivLevel::Const(n) => write!(f, "{n}"),
            UnivLevel::Omega => f.write_str("oo"),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Expr::*;
        match self {
            Ref(_, v) => write!(f, "{v}"),
            Hole(_) => f.write_str("_"),
            Lam(_, p, b) => write!(f, "\\{p} => {b}"),
            Pi(_, p, b) => write!(f, "Pi {p} -> {b}"),
            App(_, a, ParamInfo::Explicit, b) => write!(f, "({a} {b})"),
            App(_, a, ParamInfo::Implicit, b) => write!(f, "({a} {{{b}}})"),
            Sigma(_, tele) => write!(f, "Sig {}", Param::tele_to_string(tele)),
            Tuple(_, xs) => write!(
                f,
                "({})",
                xs.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", ")
            ),
            Proj(_, a, ProjIx::Index(i)) => write!(f, "{a}.{i}"),
            Proj(_, a, ProjIx::Field(n)) => write!(f, "{a}.{n}"),
            New(_, s, fields) => {
                write!(f, "new {s} {{")?;
                for i in fields {
                    write!(f, " | {} => {}", i.name, i.value)?;
                }
                f.write_str(" }")
            }
            Univ(_, u, h) => write!(f, "Type {u} {h}"),
            LitInt(_, n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Bind(Loc, Var),
    Wildcard(Loc),
    Absurd(Loc),
    Number(Loc, u64),
    Tuple(Loc, Vec<Pattern>, Option<Var>),
    /// Constructor or primitive endpoint, with sub-patterns and an optional
    /// as-binding.
    Ctor(Loc, Var, Vec<Pattern>, Option<Var>),
    /// `{p}`, matching an implicit parameter.
    Implicit(Box<Pattern>),
}

impl Pattern {
    pub fn loc(&self) -> Loc {
        use Pattern::*;
        match self {
            Bind(loc, _) | Wildcard(loc) | Absurd(loc) | Number(loc, _) => *loc,
            Tuple(loc, ..) | Ctor(loc, ..) => *loc,
            Implicit(p) => p.loc(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Clause {
    pub loc: Loc,
    pub pats: Vec<Pattern>,
    pub body: Option<Expr>,
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Pattern::*;
        match self {
            Bind(_, v) => write!(f, "{v}"),
            Wildcard(_) => f.write_str("_"),
            Absurd(_) => f.write_str("()"),
            Number(_, n) => write!(f, "{n}"),
            Tuple(_, ps, _) => write!(
                f,
                "({})",
                ps.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
            ),
            Ctor(_, v, ps, _) if ps.is_empty() => write!(f, "{v}"),
            Ctor(_, v, ps, _) => {
                write!(f, "({v}")?;
                for p in ps {
                    write!(f, " {p}")?;
                }
                f.write_str(")")
            }
            Implicit(p) => write!(f, "{{{p}}}"),
        }
    }
}

impl Display for Clause {
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
