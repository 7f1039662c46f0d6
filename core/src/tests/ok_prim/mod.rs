use crate::tests::{app, call, check_ok, clause, clauses, eval, func, param, pctor, prim, r, univ};
use crate::theory::abs::builtin::PrimId;
use crate::theory::abs::data::{Call, Term};
use crate::theory::abs::level::Sort;
use crate::theory::Var;

#[test]
fn test_interval() {
    let i = Var::new("I");
    let (left, right, invol) = (Var::new("left"), Var::new("right"), Var::new("invol"));
    let (flip, twice) = (Var::new("flip"), Var::new("twice"));
    let (x, y, z) = (Var::new("i"), Var::new("i"), Var::new("i"));
    let driver = check_ok(vec![
        prim(&i, vec![], univ(0, 0)),
        prim(&left, vec![], r(&i)),
        prim(&right, vec![], r(&i)),
        prim(&invol, vec![param(&x, r(&i))], r(&i)),
        clauses(
            &flip,
            vec![param(&y, r(&i))],
            r(&i),
            vec![
                clause([pctor(&left, [])], r(&right)),
                clause([pctor(&right, [])], r(&left)),
            ],
        ),
        func(
            &twice,
            vec![param(&z, r(&i))],
            r(&i),
            app(r(&invol), [app(r(&invol), [r(&z)])]),
        ),
    ]);
    assert_eq!(driver.prims().var(PrimId::Invol), Some(&invol));
    assert!(driver.prims().is_interval(&Term::PrimCall(Call::new(
        i.clone(),
        Sort::constant(0, 0),
        Default::default()
    ))));

    let end = |v: &Var| Term::PrimCall(Call::new(v.clone(), Sort::constant(0, 0), Default::default()));
    assert_eq!(eval(&driver, call(&flip, vec![end(&left)])), end(&right));
    assert_eq!(eval(&driver, call(&flip, vec![end(&right)])), end(&left));
    assert_eq!(eval(&driver, call(&twice, vec![end(&left)])), end(&left));
}
