use crate::tests::{check_ok, clause, clauses, param, pbind, pctor, r, Nat};
use crate::theory::Var;
use crate::Error;

#[test]
fn test_shadowed_clause() {
    let nat = Nat::new();
    let g = Var::new("g");
    let (n, k) = (Var::new("n"), Var::new("k"));
    let zero = &nat.zero;
    let mut defs = nat.defs();
    defs.push(clauses(
        &g,
        vec![param(&n, nat.t())],
        nat.t(),
        vec![
            clause([pctor(zero, [])], r(zero)),
            clause([pctor(&nat.suc, [pbind(&k)])], r(&k)),
            clause([pctor(zero, [])], r(zero)),
        ],
    ));
    let driver = check_ok(defs);
    let warnings = driver.reporter().warnings().collect::<Vec<_>>();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0].error, Error::RedundantClause(_)));
    assert!(driver.sigma().def(&g).is_some());
}
