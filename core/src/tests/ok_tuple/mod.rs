use crate::tests::{app, call, check_ok, clause, clauses, eval, loc, param, pbind, pctor, ptuple, r, sigma, Nat};
use crate::theory::abs::builtin::Prims;
use crate::theory::abs::data::Term;
use crate::theory::abs::def::Body;
use crate::theory::abs::meta::Metas;
use crate::theory::abs::normalize::Normalizer;
use crate::theory::conc::classify::Classifier;
use crate::theory::Var;

/// `max` over a pair: splitting the tuple opens both components.
#[test]
fn test_tuple_classes() {
    let nat = Nat::new();
    let pmax = Var::new("pmax");
    let (p, x, y) = (Var::new("p"), Var::new("x"), Var::new("y"));
    let (a1, a2, b1, b2) = (Var::new("a"), Var::new("a"), Var::new("b"), Var::new("b"));
    let (zero, suc) = (&nat.zero, &nat.suc);
    let mut defs = nat.defs();
    defs.push(clauses(
        &pmax,
        vec![param(&p, sigma(vec![param(&x, nat.t()), param(&y, nat.t())]))],
        nat.t(),
        vec![
            clause([ptuple([pctor(zero, []), pbind(&b1)])], r(&b1)),
            clause([ptuple([pbind(&a1), pctor(zero, [])])], r(&a1)),
            clause(
                [ptuple([pctor(suc, [pbind(&a2)]), pctor(suc, [pbind(&b2)])])],
                app(r(suc), [r(&a2)]),
            ),
        ],
    ));
    let driver = check_ok(defs);
    assert!(driver.reporter().warnings().next().is_none());

    let def = driver.sigma().def(&pmax).unwrap();
    let Body::Clauses(ms) = &def.body else {
        panic!("expected clauses")
    };
    let prims = Prims::default();
    let metas = Metas::default();
    let n = Normalizer::new(driver.sigma(), &prims, &metas, loc());
    let classes = Classifier::new(n, &prims, loc())
        .classify(ms, &def.tele)
        .unwrap();
    let classes = classes.into_iter().map(|c| c.clauses).collect::<Vec<_>>();
    assert_eq!(classes, vec![vec![0, 1], vec![0], vec![1], vec![2]]);

    let pair = Term::Tuple(vec![nat.num(2), nat.num(1)]);
    assert_eq!(eval(&driver, call(&pmax, vec![pair])), nat.num(2));
}
