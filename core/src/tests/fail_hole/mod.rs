use crate::tests::{at, call, check_err, check_ok, eval, func, hole_at, lam, loc, param, r, ty, Nat};
use crate::theory::abs::data::Term;
use crate::theory::{Loc, Var};
use crate::Error;

#[test]
fn test_hole() {
    let nat = Nat::new();
    let h = Var::new("h");
    let mut defs = nat.defs();
    defs.push(func(&h, vec![], nat.t(), hole_at(at(20, 21))));
    match check_err(defs) {
        Error::UnsolvedMeta(_, Loc { end, .. }) => assert_eq!(end, 21),
        _ => assert!(false),
    }
}

#[test]
fn test_hole_out_of_scope() {
    let f = Var::new("f");
    let (x, a_ty, a) = (Var::new("x"), Var::new("A"), Var::new("a"));
    let tele = vec![param(&x, hole_at(loc())), param(&a_ty, ty()), param(&a, r(&a_ty))];
    match check_err(vec![func(&f, tele, r(&a_ty), r(&x))]) {
        Error::BadlyScoped(_, v, _) => assert_eq!(v, a_ty),
        _ => assert!(false),
    }
}

/// Lambdas checked against an unknown type open holes under their own
/// binders.
#[test]
fn test_hole_lam() {
    let f = Var::new("f");
    let a_ty = Var::new("A");
    let a = Var::new("a");
    let body = lam(&a_ty, ty(), lam(&a, r(&a_ty), r(&a)));
    let driver = check_ok(vec![func(&f, vec![], hole_at(loc()), body)]);
    let def = driver.sigma().def(&f).unwrap();
    assert!(matches!(def.ret.as_ref(), Term::Pi(..)));
}

#[test]
fn test_hole_solved() {
    let nat = Nat::new();
    let k = Var::new("k");
    let n = Var::new("n");
    let mut defs = nat.defs();
    defs.push(func(&k, vec![param(&n, nat.t())], hole_at(loc()), r(&n)));
    let driver = check_ok(defs);
    let def = driver.sigma().def(&k).unwrap();
    assert_eq!(def.ret.to_string(), "Nat");
    assert_eq!(eval(&driver, call(&k, vec![nat.num(1)])), nat.num(1));
}
