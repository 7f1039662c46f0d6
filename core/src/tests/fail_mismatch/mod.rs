use crate::tests::{check_err, func, param, r, Nat};
use crate::theory::Var;
use crate::Error;

#[test]
fn test_type_as_value() {
    let nat = Nat::new();
    let f = Var::new("f");
    let n = Var::new("n");
    let mut defs = nat.defs();
    defs.push(func(&f, vec![param(&n, nat.t())], nat.t(), nat.t()));
    match check_err(defs) {
        Error::TypeMismatch { expected, .. } => assert_eq!(expected.to_string(), "Nat"),
        _ => assert!(false),
    }
}
