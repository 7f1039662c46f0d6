use crate::tests::{app, call, check_ok, clause, clauses, eval, param, pbind, pctor, r, Nat};
use crate::theory::Var;

/// Ackermann's function: the first argument descends, or stays put while
/// the second one does.
#[test]
fn test_ack() {
    let nat = Nat::new();
    let ack = Var::new("ack");
    let (m, n) = (Var::new("m"), Var::new("n"));
    let (b1, a2, a3, b3) = (Var::new("n"), Var::new("m"), Var::new("m"), Var::new("n"));
    let (zero, suc) = (&nat.zero, &nat.suc);
    let mut defs = nat.defs();
    defs.push(clauses(
        &ack,
        vec![param(&m, nat.t()), param(&n, nat.t())],
        nat.t(),
        vec![
            clause([pctor(zero, []), pbind(&b1)], app(r(suc), [r(&b1)])),
            clause(
                [pctor(suc, [pbind(&a2)]), pctor(zero, [])],
                app(r(&ack), [r(&a2), app(r(suc), [r(zero)])]),
            ),
            clause(
                [pctor(suc, [pbind(&a3)]), pctor(suc, [pbind(&b3)])],
                app(
                    r(&ack),
                    [r(&a3), app(r(&ack), [app(r(suc), [r(&a3)]), r(&b3)])],
                ),
            ),
        ],
    ));
    let driver = check_ok(defs);
    assert!(driver.reporter().warnings().next().is_none());
    let tm = eval(&driver, call(&ack, vec![nat.num(2), nat.num(1)]));
    assert_eq!(tm, nat.num(5));
}
