use crate::problem::{Problems, Severity};
use crate::theory::abs::data::{Call, ConCall, Term};
use crate::theory::abs::def::{Body, CtorBody, Def, FieldBody};
use crate::theory::abs::level::Sort;
use crate::theory::abs::meta::Metas;
use crate::theory::abs::normalize::Normalizer;
use crate::theory::conc::data::{Clause, Expr, FieldInit, Pattern, ProjIx, UnivLevel};
use crate::theory::ParamInfo::{Explicit, Implicit};
use crate::theory::{FileId, Loc, Param, Tele, Var};
use crate::{Driver, Error};

mod fail_conditions;
mod fail_confluence;
mod fail_hole;
mod fail_level;
mod fail_mismatch;
mod fail_missing_case;
mod fail_occurs;
mod fail_patterns;
mod fail_prim;
mod fail_spine;
mod ok_ack;
mod ok_add;
mod ok_id;
mod ok_patterns;
mod ok_prim;
mod ok_redundant;
mod ok_struct;
mod ok_tuple;

pub fn loc() -> Loc {
    Loc::default()
}

/// A one-line position spanning `start..end`.
pub fn at(start: usize, end: usize) -> Loc {
    Loc::new(FileId::default(), start, end, 1, start + 1)
}

pub fn r(v: &Var) -> Expr {
    Expr::Ref(loc(), v.clone())
}

pub fn app<const N: usize>(f: Expr, xs: [Expr; N]) -> Expr {
    xs.into_iter()
        .fold(f, |f, x| Expr::App(loc(), Box::new(f), Explicit, Box::new(x)))
}

/// `Type lp lp`.
pub fn ty() -> Expr {
    Expr::Univ(loc(), UnivLevel::Poly(0), UnivLevel::Poly(0))
}

pub fn univ(u: u32, h: u32) -> Expr {
    Expr::Univ(loc(), UnivLevel::Const(u), UnivLevel::Const(h))
}

pub fn hole_at(l: Loc) -> Expr {
    Expr::Hole(l)
}

pub fn lam(v: &Var, typ: Expr, body: Expr) -> Expr {
    Expr::Lam(loc(), param(v, typ), Box::new(body))
}

pub fn pi(v: &Var, dom: Expr, cod: Expr) -> Expr {
    Expr::Pi(loc(), param(v, dom), Box::new(cod))
}

pub fn sigma(tele: Tele<Expr>) -> Expr {
    Expr::Sigma(loc(), tele)
}

pub fn lit(n: u64) -> Expr {
    Expr::LitInt(loc(), n)
}

pub fn proj(a: Expr, name: &str) -> Expr {
    Expr::Proj(loc(), Box::new(a), ProjIx::Field(name.into()))
}

pub fn new(s: Expr, inits: Vec<(&str, Expr)>) -> Expr {
    let inits = inits
        .into_iter()
        .map(|(name, value)| FieldInit {
            loc: loc(),
            name: name.into(),
            value,
        })
        .collect();
    Expr::New(loc(), Box::new(s), inits)
}

pub fn param(v: &Var, typ: Expr) -> Param<Expr> {
    Param::new(v.clone(), Explicit, typ)
}

pub fn implicit(v: &Var, typ: Expr) -> Param<Expr> {
    Param::new(v.clone(), Implicit, typ)
}

fn def(name: &Var, tele: Tele<Expr>, ret: Expr, body: Body<Expr>) -> Def<Expr> {
    Def {
        loc: loc(),
        name: name.clone(),
        tele,
        ret: Box::new(ret),
        body,
    }
}

pub fn func(name: &Var, tele: Tele<Expr>, ret: Expr, body: Expr) -> Def<Expr> {
    def(name, tele, ret, Body::Fn(body))
}

pub fn clauses(name: &Var, tele: Tele<Expr>, ret: Expr, cs: Vec<Clause>) -> Def<Expr> {
    def(name, tele, ret, Body::Clauses(cs))
}

pub fn clause<const N: usize>(pats: [Pattern; N], body: Expr) -> Clause {
    Clause {
        loc: loc(),
        pats: pats.into(),
        body: Some(body),
    }
}

pub fn absurd_clause<const N: usize>(pats: [Pattern; N]) -> Clause {
    Clause {
        loc: loc(),
        pats: pats.into(),
        body: None,
    }
}

pub fn pbind(v: &Var) -> Pattern {
    Pattern::Bind(loc(), v.clone())
}

pub fn pctor<const N: usize>(v: &Var, ps: [Pattern; N]) -> Pattern {
    Pattern::Ctor(loc(), v.clone(), ps.into(), None)
}

pub fn pwild() -> Pattern {
    Pattern::Wildcard(loc())
}

pub fn ptuple<const N: usize>(ps: [Pattern; N]) -> Pattern {
    Pattern::Tuple(loc(), ps.into(), None)
}

pub fn pnum(n: u64) -> Pattern {
    Pattern::Number(loc(), n)
}

pub fn pabsurd() -> Pattern {
    Pattern::Absurd(loc())
}

pub fn pimplicit(p: Pattern) -> Pattern {
    Pattern::Implicit(Box::new(p))
}

pub fn data(name: &Var, tele: Tele<Expr>, ret: Expr, ctors: &[&Var]) -> Def<Expr> {
    let ctors = ctors.iter().map(|&c| c.clone()).collect();
    def(name, tele, ret, Body::Data(ctors))
}

pub fn ctor(name: &Var, data: &Var, tele: Tele<Expr>, conditions: Vec<Clause>) -> Def<Expr> {
    let body = Body::Ctor(CtorBody {
        data: data.clone(),
        clauses: conditions,
    });
    def(name, tele, r(data), body)
}

pub fn structure(name: &Var, tele: Tele<Expr>, ret: Expr, fields: &[&Var]) -> Def<Expr> {
    let fields = fields.iter().map(|&f| f.clone()).collect();
    def(name, tele, ret, Body::Struct(fields))
}

pub fn field(name: &Var, structure: &Var, ret: Expr, default: Option<Expr>) -> Def<Expr> {
    let body = Body::Field(FieldBody {
        structure: structure.clone(),
        default,
    });
    def(name, Default::default(), ret, body)
}

pub fn prim(name: &Var, tele: Tele<Expr>, ret: Expr) -> Def<Expr> {
    def(name, tele, ret, Body::Prim)
}

/// `data Nat : Type | zero | suc (n : Nat)`.
pub struct Nat {
    pub nat: Var,
    pub zero: Var,
    pub suc: Var,
}

impl Nat {
    pub fn new() -> Self {
        Self {
            nat: Var::new("Nat"),
            zero: Var::new("zero"),
            suc: Var::new("suc"),
        }
    }

    pub fn defs(&self) -> Vec<Def<Expr>> {
        let n = Var::new("n");
        vec![
            data(&self.nat, vec![], ty(), &[&self.zero, &self.suc]),
            ctor(&self.zero, &self.nat, vec![], vec![]),
            ctor(&self.suc, &self.nat, vec![param(&n, self.t())], vec![]),
        ]
    }

    pub fn t(&self) -> Expr {
        r(&self.nat)
    }

    /// The checked numeral `n`.
    pub fn num(&self, n: usize) -> Term {
        let data = Call::new(self.nat.clone(), Sort::constant(0, 0), Default::default());
        (0..n).fold(
            Term::ConCall(ConCall {
                data: data.clone(),
                ctor: self.zero.clone(),
                args: Default::default(),
            }),
            |x, _| {
                Term::ConCall(ConCall {
                    data: data.clone(),
                    ctor: self.suc.clone(),
                    args: vec![x],
                })
            },
        )
    }
}

pub fn call(f: &Var, args: Vec<Term>) -> Term {
    Term::FnCall(Call::new(f.clone(), Sort::constant(0, 0), args))
}

/// Normal form of `tm` against the definitions checked so far.
pub fn eval(driver: &Driver<Problems>, tm: Term) -> Term {
    let metas = Metas::default();
    Normalizer::new(driver.sigma(), driver.prims(), &metas, loc())
        .nf(tm)
        .unwrap()
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn check_helper(defs: Vec<Def<Expr>>) -> (bool, Driver<Problems>) {
    init_logger();
    let mut driver = Driver::new(Problems::default());
    let ok = driver.check(defs);
    (ok, driver)
}

pub fn check_ok(defs: Vec<Def<Expr>>) -> Driver<Problems> {
    let (ok, driver) = check_helper(defs);
    if !ok {
        let errors = driver
            .reporter()
            .errors()
            .map(|p| p.to_string())
            .collect::<Vec<_>>();
        panic!("test failure: {errors:#?}")
    }
    driver
}

pub fn check_err(defs: Vec<Def<Expr>>) -> Error {
    let (ok, driver) = check_helper(defs);
    assert!(!ok);
    driver
        .into_reporter()
        .into_vec()
        .into_iter()
        .find(|p| p.severity == Severity::Error)
        .map(|p| p.error)
        .unwrap()
}
