use crate::tests::{app, call, check_err, check_ok, eval, field, func, new, param, proj, r, structure, ty, Nat};
use crate::theory::abs::def::{Body, Def, Head};
use crate::theory::conc::data::Expr;
use crate::theory::Var;
use crate::Error;

/// `struct Point : Type | x : Nat | y : Nat := zero`.
struct Point {
    nat: Nat,
    point: Var,
    x: Var,
    y: Var,
}

impl Point {
    fn new() -> Self {
        Self {
            nat: Nat::new(),
            point: Var::new("Point"),
            x: Var::new("x"),
            y: Var::new("y"),
        }
    }

    fn defs(&self) -> Vec<Def<Expr>> {
        let nat = &self.nat;
        let mut defs = nat.defs();
        defs.extend([
            structure(&self.point, vec![], ty(), &[&self.x, &self.y]),
            field(&self.x, &self.point, nat.t(), None),
            field(&self.y, &self.point, nat.t(), Some(r(&nat.zero))),
        ]);
        defs
    }
}

#[test]
fn test_struct() {
    let pt = Point::new();
    let nat = &pt.nat;
    let (origin, getx, gety, swap) = (
        Var::new("origin"),
        Var::new("getx"),
        Var::new("gety"),
        Var::new("swap"),
    );
    let (p, q) = (Var::new("p"), Var::new("q"));

    let mut defs = pt.defs();
    defs.extend([
        func(&origin, vec![], r(&pt.point), new(r(&pt.point), vec![("x", app(r(&nat.suc), [r(&nat.zero)]))])),
        func(&getx, vec![param(&p, r(&pt.point))], nat.t(), proj(r(&p), "x")),
        func(&gety, vec![param(&q, r(&pt.point))], nat.t(), proj(r(&q), "y")),
    ]);
    let s = Var::new("s");
    defs.push(func(
        &swap,
        vec![param(&s, r(&pt.point))],
        r(&pt.point),
        new(
            r(&pt.point),
            vec![("y", proj(r(&s), "x")), ("x", proj(r(&s), "y"))],
        ),
    ));
    let driver = check_ok(defs);

    match &driver.sigma().def(&pt.point).unwrap().body {
        Body::Struct(fields) => assert_eq!(fields, &vec![pt.x.clone(), pt.y.clone()]),
        _ => assert!(false),
    }
    assert_eq!(
        driver.sigma().sig(&pt.y).unwrap().head,
        Head::Field(pt.point.clone())
    );

    let o = call(&origin, vec![]);
    assert_eq!(eval(&driver, call(&getx, vec![o.clone()])), nat.num(1));
    assert_eq!(eval(&driver, call(&gety, vec![o.clone()])), nat.num(0));
    let swapped = call(&swap, vec![o]);
    assert_eq!(eval(&driver, call(&getx, vec![swapped.clone()])), nat.num(0));
    assert_eq!(eval(&driver, call(&gety, vec![swapped])), nat.num(1));
}

#[test]
fn test_missing_field() {
    let pt = Point::new();
    let bad = Var::new("bad");
    let mut defs = pt.defs();
    defs.push(func(&bad, vec![], r(&pt.point), new(r(&pt.point), vec![])));
    match check_err(defs) {
        Error::MissingField(f, _) => assert_eq!(f, pt.x),
        _ => assert!(false),
    }
}

#[test]
fn test_no_such_field() {
    let pt = Point::new();
    let (bad, p) = (Var::new("bad"), Var::new("p"));
    let mut defs = pt.defs();
    defs.push(func(
        &bad,
        vec![param(&p, r(&pt.point))],
        pt.nat.t(),
        proj(r(&p), "z"),
    ));
    match check_err(defs) {
        Error::NoSuchField(name, _, _) => assert_eq!(name, "z"),
        _ => assert!(false),
    }
}
