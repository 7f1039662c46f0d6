use crate::tests::ok_conditions::Int;
use crate::tests::{app, check_err, clause, clauses, param, pbind, pctor, r};
use crate::theory::Var;
use crate::Error;

#[test]
fn test_conditions() {
    let int = Int::new();
    let succ = Var::new("succ");
    let wrong = app(r(&int.pos), [r(&int.nat.zero)]);
    let mut defs = int.defs();
    defs.push(int.succ(&succ, wrong));
    match check_err(defs) {
        Error::Conditions {
            expected, actual, ..
        } => {
            assert_eq!(expected.to_string(), "pos zero");
            assert_eq!(actual.to_string(), "pos (suc zero)");
        }
        _ => assert!(false),
    }
}

#[test]
fn test_conflicting_conditions() {
    let int = Int::new();
    let nat = &int.nat;
    let defs = int.defs_with(vec![
        clause([pctor(&nat.zero, [])], app(r(&int.pos), [r(&nat.zero)])),
        clause(
            [pctor(&nat.zero, [])],
            app(r(&int.pos), [app(r(&nat.suc), [r(&nat.zero)])]),
        ),
    ]);
    match check_err(defs) {
        Error::Confluence { lhs, rhs, .. } => {
            assert_eq!(lhs.to_string(), "pos zero");
            assert_eq!(rhs.to_string(), "pos (suc zero)");
        }
        _ => assert!(false),
    }
}

/// `g (neg n) m` at `n = zero` replays as `g (pos zero) m`, which no clause
/// unfolds while `m` is a variable.
#[test]
fn test_no_clause_applies() {
    let int = Int::new();
    let nat = &int.nat;
    let g = Var::new("g");
    let (i, m) = (Var::new("i"), Var::new("m"));
    let (n1, n2, n3) = (Var::new("n"), Var::new("n"), Var::new("n"));
    let (k, m1) = (Var::new("k"), Var::new("m"));
    let mut defs = int.defs();
    defs.push(clauses(
        &g,
        vec![param(&i, int.t()), param(&m, nat.t())],
        nat.t(),
        vec![
            clause(
                [pctor(&int.pos, [pbind(&n1)]), pctor(&nat.zero, [])],
                r(&nat.zero),
            ),
            clause(
                [pctor(&int.pos, [pbind(&n2)]), pctor(&nat.suc, [pbind(&k)])],
                r(&nat.zero),
            ),
            clause([pctor(&int.neg, [pbind(&n3)]), pbind(&m1)], r(&nat.zero)),
        ],
    ));
    match check_err(defs) {
        Error::ConditionsStuck { expected, .. } => assert_eq!(expected.to_string(), "zero"),
        _ => assert!(false),
    }
}
