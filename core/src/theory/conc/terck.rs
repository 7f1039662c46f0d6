use std::collections::HashSet;

use crate::theory::abs::data::Term;
use crate::theory::abs::pat::{Matching, Pat};
use crate::theory::{Loc, Var};
use crate::Error;

/// How a self-call argument relates to the pattern at its position.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Rel {
    Lt,
    Le,
    Unknown,
}

/// Variables bound strictly inside a constructor or tuple pattern.
fn smaller(p: &Pat) -> HashSet<Var> {
    match p {
        Pat::Ctor(c) => c.args.iter().flat_map(Pat::binds).collect(),
        Pat::Tuple(ps, _) => ps.iter().flat_map(Pat::binds).collect(),
        _ => Default::default(),
    }
}

/// Whether `tm` is exactly the value `p` matched.
fn same(p: &Pat, tm: &Term) -> bool {
    match (p, tm) {
        (Pat::Bind(v), Term::Ref(x)) => v == x,
        (Pat::Ctor(c), Term::Ref(x)) => c.as_bind.as_ref() == Some(x),
        (Pat::Tuple(_, v), Term::Ref(x)) => v.as_ref() == Some(x),
        (Pat::Ctor(c), Term::ConCall(x)) => {
            c.ctor == x.ctor
                && c.args.len() == x.args.len()
                && c.args.iter().zip(&x.args).all(|(p, a)| same(p, a))
        }
        (Pat::Tuple(ps, _), Term::Tuple(xs)) => {
            ps.len() == xs.len() && ps.iter().zip(xs).all(|(p, a)| same(p, a))
        }
        _ => false,
    }
}

fn relate(p: &Pat, tm: &Term) -> Rel {
    match tm {
        Term::Ref(v) if smaller(p).contains(v) => Rel::Lt,
        tm if same(p, tm) => Rel::Le,
        _ => Rel::Unknown,
    }
}

fn self_calls(f: &Var, body: &Term) -> Vec<Vec<Term>> {
    let mut calls = Vec::default();
    body.visit(&mut |tm| {
        if let Term::FnCall(c) = tm {
            if &c.def == f {
                calls.push(c.args.clone());
            }
        }
    });
    calls
}

/// The self-calls of `f` must all descend along one lexicographic order of
/// its argument positions: at each chosen position every remaining call
/// passes a structurally smaller or equal argument, and the calls passing
/// a smaller one are discharged.
pub fn clauses(f: &Var, clauses: &[Matching]) -> Result<(), Error> {
    let arity = clauses.first().map_or(0, |m| m.pats.len());
    let mut calls = Vec::default();
    for m in clauses {
        let Some(body) = &m.body else {
            continue;
        };
        for args in self_calls(f, body) {
            let rels = (0..arity)
                .map(|i| match (m.pats.get(i), args.get(i)) {
                    (Some(p), Some(a)) => relate(p, a),
                    _ => Rel::Unknown,
                })
                .collect::<Vec<_>>();
            calls.push((m.loc, rels));
        }
    }

    let mut cols = (0..arity).collect::<Vec<_>>();
    while let Some(&(loc, _)) = calls.first() {
        let next = cols.iter().position(|&i| {
            calls.iter().all(|(_, r)| r[i] != Rel::Unknown)
                && calls.iter().any(|(_, r)| r[i] == Rel::Lt)
        });
        let Some(k) = next else {
            return Err(Error::NonTerminating(f.clone(), loc));
        };
        let i = cols.remove(k);
        calls.retain(|(_, r)| r[i] != Rel::Lt);
    }
    Ok(())
}

/// A single-expression body may not call itself at all.
pub fn body(f: &Var, body: &Term, loc: Loc) -> Result<(), Error> {
    if self_calls(f, body).is_empty() {
        return Ok(());
    }
    Err(Error::NonTerminating(f.clone(), loc))
}
