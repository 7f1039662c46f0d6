use crate::tests::{app, check_err, clause, clauses, param, pbind, pctor, r, Nat};
use crate::theory::Var;
use crate::Error;

#[test]
fn test_overlap_disagrees() {
    let nat = Nat::new();
    let f = Var::new("f");
    let (m, n) = (Var::new("m"), Var::new("n"));
    let (a1, a2, b1, b2) = (Var::new("a"), Var::new("a"), Var::new("b"), Var::new("b"));
    let (zero, suc) = (&nat.zero, &nat.suc);
    let mut defs = nat.defs();
    defs.push(clauses(
        &f,
        vec![param(&m, nat.t()), param(&n, nat.t())],
        nat.t(),
        vec![
            clause([pctor(zero, []), pbind(&b1)], r(&b1)),
            clause([pbind(&a1), pctor(zero, [])], app(r(suc), [r(&a1)])),
            clause([pctor(suc, [pbind(&a2)]), pctor(suc, [pbind(&b2)])], r(zero)),
        ],
    ));
    match check_err(defs) {
        Error::Confluence { lhs, rhs, .. } => {
            assert_eq!(lhs.to_string(), "zero");
            assert_eq!(rhs.to_string(), "suc zero");
        }
        _ => assert!(false),
    }
}
