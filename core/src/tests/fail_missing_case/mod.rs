use crate::problem::Stage;
use crate::tests::{app, check_err, clause, clauses, param, pbind, pctor, pwild, r, Nat};
use crate::theory::Var;
use crate::Error;

#[test]
fn test_missing_case() {
    let nat = Nat::new();
    let min = Var::new("min");
    let (m, n) = (Var::new("m"), Var::new("n"));
    let (a, b) = (Var::new("a"), Var::new("b"));
    let (zero, suc) = (&nat.zero, &nat.suc);

    let mut defs = nat.defs();
    defs.push(clauses(
        &min,
        vec![param(&m, nat.t()), param(&n, nat.t())],
        nat.t(),
        vec![
            clause([pctor(zero, []), pwild()], r(zero)),
            clause(
                [pctor(suc, [pbind(&a)]), pctor(suc, [pbind(&b)])],
                app(r(suc), [app(r(&min), [r(&a), r(&b)])]),
            ),
        ],
    ));
    let e = check_err(defs);
    assert_eq!(e.stage(), Stage::Tyck);
    match e {
        Error::MissingCase(case, _) => assert_eq!(case, "suc _, zero"),
        _ => assert!(false),
    }
}
