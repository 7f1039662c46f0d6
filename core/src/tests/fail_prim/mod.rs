use crate::problem::{Problems, Severity};
use crate::tests::{check_err, prim, univ};
use crate::theory::Var;
use crate::{Driver, Error};

#[test]
fn test_prim_order() {
    let mut driver = Driver::new(Problems::default());
    let ok = driver.check(vec![
        prim(&Var::new("left"), vec![], univ(0, 0)),
        prim(&Var::new("I"), vec![], univ(0, 0)),
        prim(&Var::new("I"), vec![], univ(0, 0)),
        prim(&Var::new("foo"), vec![], univ(0, 0)),
    ]);
    assert!(!ok);
    let problems = driver.into_reporter().into_vec();
    assert!(problems.iter().all(|p| p.severity == Severity::Error));
    let errors = problems.into_iter().map(|p| p.error).collect::<Vec<_>>();
    match errors.as_slice() {
        [Error::PrimDependency(a, b, _), Error::RedefinedPrim(c, _), Error::UnknownPrim(d, _)] => {
            assert_eq!(a.as_str(), "left");
            assert_eq!(b.as_str(), "I");
            assert_eq!(c.as_str(), "I");
            assert_eq!(d.as_str(), "foo");
        }
        _ => assert!(false),
    }
}

#[test]
fn test_prim_type() {
    let i = Var::new("I");
    let left = Var::new("left");
    let e = check_err(vec![
        prim(&i, vec![], univ(0, 0)),
        prim(&left, vec![], univ(0, 0)),
    ]);
    match e {
        Error::TypeMismatch { expected, .. } => assert_eq!(expected.to_string(), "I"),
        _ => assert!(false),
    }
}
