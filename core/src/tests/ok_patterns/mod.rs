use crate::tests::{
    absurd_clause, app, call, check_ok, clause, clauses, data, eval, implicit, lit, pabsurd,
    param, pbind, pctor, pimplicit, pnum, r, ty, Nat,
};
use crate::theory::abs::data::{Call, Term};
use crate::theory::abs::def::Body;
use crate::theory::abs::level::Sort;
use crate::theory::abs::pat::Pat;
use crate::theory::Var;

#[test]
fn test_literal_patterns() {
    let nat = Nat::new();
    let pred = Var::new("pred");
    let (n, k) = (Var::new("n"), Var::new("k"));
    let suc = &nat.suc;
    let mut defs = nat.defs();
    defs.push(clauses(
        &pred,
        vec![param(&n, nat.t())],
        nat.t(),
        vec![
            clause([pnum(0)], lit(0)),
            clause([pnum(1)], lit(0)),
            clause([pctor(suc, [pctor(suc, [pbind(&k)])])], app(r(suc), [r(&k)])),
        ],
    ));
    let driver = check_ok(defs);
    assert!(driver.reporter().warnings().next().is_none());
    assert_eq!(eval(&driver, call(&pred, vec![nat.num(3)])), nat.num(2));
    assert_eq!(eval(&driver, call(&pred, vec![nat.num(1)])), nat.num(0));
    assert_eq!(eval(&driver, call(&pred, vec![nat.num(0)])), nat.num(0));
}

#[test]
fn test_absurd_pattern() {
    let empty = Var::new("Empty");
    let elim = Var::new("elim");
    let (a_ty, e) = (Var::new("A"), Var::new("e"));
    let defs = vec![
        data(&empty, vec![], ty(), &[]),
        clauses(
            &elim,
            vec![implicit(&a_ty, ty()), param(&e, r(&empty))],
            r(&a_ty),
            vec![absurd_clause([pabsurd()])],
        ),
    ];
    let driver = check_ok(defs);
    let def = driver.sigma().def(&elim).unwrap();
    let Body::Clauses(ms) = &def.body else {
        panic!("expected clauses")
    };
    assert_eq!(ms.len(), 1);
    assert!(ms[0].body.is_none());
    assert!(matches!(ms[0].pats.as_slice(), [Pat::Bind(_), Pat::Absurd]));
}

#[test]
fn test_implicit_pattern() {
    let nat = Nat::new();
    let konst = Var::new("konst");
    let (a_ty, a, b) = (Var::new("A"), Var::new("a"), Var::new("b"));
    let (b_ty, x, y) = (Var::new("B"), Var::new("x"), Var::new("y"));
    let mut defs = nat.defs();
    defs.push(clauses(
        &konst,
        vec![implicit(&a_ty, ty()), param(&a, r(&a_ty)), param(&b, r(&a_ty))],
        r(&a_ty),
        vec![clause([pimplicit(pbind(&b_ty)), pbind(&x), pbind(&y)], r(&x))],
    ));
    let driver = check_ok(defs);
    let def = driver.sigma().def(&konst).unwrap();
    let Body::Clauses(ms) = &def.body else {
        panic!("expected clauses")
    };
    assert_eq!(ms[0].pats[0], Pat::Bind(b_ty));

    let nat_ty = Term::DataCall(Call::new(nat.nat.clone(), Sort::constant(0, 0), Default::default()));
    let tm = eval(&driver, call(&konst, vec![nat_ty, nat.num(1), nat.num(0)]));
    assert_eq!(tm, nat.num(1));
}
