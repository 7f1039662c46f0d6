use crate::tests::{absurd_clause, check_err, clauses, pabsurd, param, Nat};
use crate::theory::Var;
use crate::Error;

#[test]
fn test_absurd_on_inhabited() {
    let nat = Nat::new();
    let bad = Var::new("bad");
    let n = Var::new("n");
    let mut defs = nat.defs();
    defs.push(clauses(
        &bad,
        vec![param(&n, nat.t())],
        nat.t(),
        vec![absurd_clause([pabsurd()])],
    ));
    match check_err(defs) {
        Error::NotAbsurd(ty, _) => assert_eq!(ty.to_string(), "Nat"),
        _ => assert!(false),
    }
}
