use crate::problem::Stage;
use crate::tests::{app, check_err, func, hole_at, loc, param, pi, r, Nat};
use crate::theory::Var;
use crate::Error;

/// The codomain hole of `x` is only ever applied to non-variables.
#[test]
fn test_non_variable_spine() {
    let nat = Nat::new();
    let f = Var::new("f");
    let (x, n) = (Var::new("x"), Var::new("n"));
    let mut defs = nat.defs();
    defs.push(func(
        &f,
        vec![param(&x, pi(&n, nat.t(), hole_at(loc())))],
        nat.t(),
        app(r(&x), [app(r(&x), [r(&nat.zero)])]),
    ));
    let e = check_err(defs);
    assert_eq!(e.stage(), Stage::Tyck);
    assert!(matches!(e, Error::BadSpine(..)));
}
