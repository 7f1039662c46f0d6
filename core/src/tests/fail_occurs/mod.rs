use crate::tests::{app, check_err, func, hole_at, loc, param, pi, r, Nat};
use crate::theory::Var;
use crate::Error;

/// `y y` with `y : _ -> Nat` asks for `_ = _ -> Nat`.
#[test]
fn test_self_application() {
    let nat = Nat::new();
    let f = Var::new("f");
    let (y, v) = (Var::new("y"), Var::new("v"));
    let mut defs = nat.defs();
    defs.push(func(
        &f,
        vec![param(&y, pi(&v, hole_at(loc()), nat.t()))],
        nat.t(),
        app(r(&y), [r(&y)]),
    ));
    assert!(matches!(check_err(defs), Error::RecursiveSolution(..)));
}
