use crate::tests::{check_err, func, univ};
use crate::theory::Var;
use crate::Error;

#[test]
fn test_level() {
    let f = Var::new("f");
    let e = check_err(vec![func(&f, vec![], univ(0, 0), univ(1, 1))]);
    match e {
        Error::LevelMismatch(..) => {}
        _ => assert!(false),
    }
}

#[test]
fn test_failed_def_not_published() {
    use crate::problem::Problems;
    use crate::Driver;

    let f = Var::new("f");
    let g = Var::new("g");
    let mut driver = Driver::new(Problems::default());
    assert!(!driver.check(vec![func(&f, vec![], univ(0, 0), univ(1, 1))]));
    assert!(driver.sigma().def(&f).is_none());
    assert!(driver.sigma().sig(&f).is_none());

    assert!(driver.check(vec![func(&g, vec![], univ(1, 1), univ(0, 0))]));
    assert!(driver.sigma().def(&g).is_some());
    assert_eq!(driver.reporter().errors().count(), 1);
}
