use crate::problem::Problems;
use crate::tests::{app, call, check_ok, clause, clauses, eval, loc, param, pbind, pctor, r, Nat};
use crate::theory::abs::builtin::Prims;
use crate::theory::abs::data::{Call, ConCall, Term};
use crate::theory::abs::def::Body;
use crate::theory::abs::level::Sort;
use crate::theory::abs::meta::Metas;
use crate::theory::abs::normalize::Normalizer;
use crate::theory::conc::classify::Classifier;
use crate::theory::Var;
use crate::Driver;

/// `add` with overlapping clauses for both zero and successor cases.
fn check_add() -> (Nat, Var, Driver<Problems>) {
    let nat = Nat::new();
    let add = Var::new("add");
    let (m, n) = (Var::new("m"), Var::new("n"));
    let (a1, a2, a3) = (Var::new("a"), Var::new("a"), Var::new("a"));
    let (b1, b2, b3) = (Var::new("b"), Var::new("b"), Var::new("b"));
    let (zero, suc) = (&nat.zero, &nat.suc);

    let mut defs = nat.defs();
    defs.push(clauses(
        &add,
        vec![param(&m, nat.t()), param(&n, nat.t())],
        nat.t(),
        vec![
            clause([pctor(zero, []), pbind(&b1)], r(&b1)),
            clause([pbind(&a1), pctor(zero, [])], r(&a1)),
            clause(
                [pctor(suc, [pbind(&a2)]), pbind(&b2)],
                app(r(suc), [app(r(&add), [r(&a2), r(&b2)])]),
            ),
            clause(
                [pbind(&a3), pctor(suc, [pbind(&b3)])],
                app(r(suc), [app(r(&add), [r(&a3), r(&b3)])]),
            ),
        ],
    ));
    let driver = check_ok(defs);
    (nat, add, driver)
}

#[test]
fn test_add() {
    let (nat, add, driver) = check_add();
    assert!(driver.reporter().warnings().next().is_none());
    let tm = eval(&driver, call(&add, vec![nat.num(2), nat.num(1)]));
    assert_eq!(tm, nat.num(3));
    let tm = eval(&driver, call(&add, vec![nat.num(0), nat.num(0)]));
    assert_eq!(tm, nat.num(0));
}

#[test]
fn test_add_classes() {
    let (_, add, driver) = check_add();
    let def = driver.sigma().def(&add).unwrap();
    let Body::Clauses(ms) = &def.body else {
        panic!("expected clauses")
    };
    assert!(def.to_string().contains("\n  | zero, b => b"));
    let prims = Prims::default();
    let metas = Metas::default();
    let n = Normalizer::new(driver.sigma(), &prims, &metas, loc());
    let classes = Classifier::new(n, &prims, loc())
        .classify(ms, &def.tele)
        .unwrap();
    let classes = classes.into_iter().map(|c| c.clauses).collect::<Vec<_>>();
    assert_eq!(classes, vec![vec![0, 1], vec![0, 3], vec![1, 2], vec![2, 3]]);
}

#[test]
fn test_max_classes() {
    let nat = Nat::new();
    let max = Var::new("max");
    let (m, n) = (Var::new("m"), Var::new("n"));
    let (a1, a2) = (Var::new("a"), Var::new("a"));
    let (b1, b2) = (Var::new("b"), Var::new("b"));
    let (zero, suc) = (&nat.zero, &nat.suc);

    let mut defs = nat.defs();
    defs.push(clauses(
        &max,
        vec![param(&m, nat.t()), param(&n, nat.t())],
        nat.t(),
        vec![
            clause([pctor(zero, []), pbind(&b1)], r(&b1)),
            clause([pbind(&a1), pctor(zero, [])], r(&a1)),
            clause(
                [pctor(suc, [pbind(&a2)]), pctor(suc, [pbind(&b2)])],
                app(r(suc), [app(r(&max), [r(&a2), r(&b2)])]),
            ),
        ],
    ));
    let driver = check_ok(defs);

    let def = driver.sigma().def(&max).unwrap();
    let Body::Clauses(ms) = &def.body else {
        panic!("expected clauses")
    };
    let prims = Prims::default();
    let metas = Metas::default();
    let n = Normalizer::new(driver.sigma(), &prims, &metas, loc());
    let classes = Classifier::new(n, &prims, loc())
        .classify(ms, &def.tele)
        .unwrap();
    let classes = classes.into_iter().map(|c| c.clauses).collect::<Vec<_>>();
    assert_eq!(classes, vec![vec![0, 1], vec![0], vec![1], vec![2]]);

    let tm = eval(&driver, call(&max, vec![nat.num(1), nat.num(2)]));
    assert_eq!(tm, nat.num(2));
}

#[test]
fn test_add_open() {
    let (nat, add, driver) = check_add();
    let (x, y) = (Var::new("x"), Var::new("y"));
    let suc = |t: Term| {
        Term::ConCall(ConCall {
            data: Call::new(nat.nat.clone(), Sort::constant(0, 0), Default::default()),
            ctor: nat.suc.clone(),
            args: vec![t],
        })
    };
    let tm = eval(&driver, call(&add, vec![Term::Ref(x.clone()), suc(Term::Ref(y.clone()))]));
    assert_eq!(tm.to_string(), "suc (add x y)");
    let tm = eval(&driver, call(&add, vec![Term::Ref(x), Term::Ref(y)]));
    assert_eq!(tm.to_string(), "add x y");
}
