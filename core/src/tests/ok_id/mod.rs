use crate::tests::{app, call, check_ok, eval, func, implicit, param, r, ty, Nat};
use crate::theory::abs::data::Term;
use crate::theory::abs::def::Body;
use crate::theory::Var;

#[test]
fn test_id() {
    let nat = Nat::new();
    let id = Var::new("id");
    let a_ty = Var::new("A");
    let a = Var::new("a");
    let use_id = Var::new("use_id");
    let n = Var::new("n");

    let mut defs = nat.defs();
    defs.push(func(
        &id,
        vec![implicit(&a_ty, ty()), param(&a, r(&a_ty))],
        r(&a_ty),
        r(&a),
    ));
    defs.push(func(
        &use_id,
        vec![param(&n, nat.t())],
        nat.t(),
        app(r(&id), [r(&n)]),
    ));
    let driver = check_ok(defs);

    let def = driver.sigma().def(&id).unwrap();
    assert_eq!(def.telescope().len(), 2);
    assert_eq!(def.result(), &Term::Ref(a_ty.clone()));
    match &def.body {
        Body::Fn(Term::Ref(v)) => assert_eq!(v, &a),
        _ => assert!(false),
    }
    let tm = eval(&driver, call(&use_id, vec![nat.num(2)]));
    assert_eq!(tm.to_string(), "suc (suc zero)");
    assert!(driver.reporter().iter().next().is_none());
}
