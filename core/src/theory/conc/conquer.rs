use crate::theory::abs::data::{ConCall, Term};
use crate::theory::abs::def::{rho_of, Body, Sigma};
use crate::theory::abs::level::Sort;
use crate::theory::abs::pat::{CtorPat, Matching, Pat};
use crate::theory::abs::subst::{Rho, Subst};
use crate::theory::conc::elab::Elaborator;
use crate::theory::Tele;
use crate::Error;

/// Constructor sub-patterns with their paths from the clause's argument
/// list.
fn ctor_pats(p: &Pat, path: Vec<usize>, out: &mut Vec<(Vec<usize>, CtorPat)>) {
    let children = match p {
        Pat::Ctor(c) => {
            out.push((path.clone(), c.clone()));
            &c.args
        }
        Pat::Tuple(ps, _) => ps,
        _ => return,
    };
    for (i, q) in children.iter().enumerate() {
        let mut path = path.clone();
        path.push(i);
        ctor_pats(q, path, out);
    }
}

/// The term of `p` with the sub-pattern at `path` replaced by `with`.
fn replace(p: &Pat, path: &[usize], with: &Term, sigma: &Sigma) -> Term {
    let Some((&i, rest)) = path.split_first() else {
        return with.clone();
    };
    let args = |ps: &[Pat]| {
        ps.iter()
            .enumerate()
            .map(|(k, q)| {
                if k == i {
                    replace(q, rest, with, sigma)
                } else {
                    q.to_term(sigma)
                }
            })
            .collect::<Vec<_>>()
    };
    match p {
        Pat::Ctor(c) => Term::ConCall(ConCall {
            data: c.data.clone(),
            ctor: c.ctor.clone(),
            args: args(c.args.as_slice()),
        }),
        Pat::Tuple(ps, _) => Term::Tuple(args(ps.as_slice())),
        p => p.to_term(sigma),
    }
}

/// First-order unification of a condition's patterns against a clause's
/// sub-patterns.
struct PatUnifier<'a> {
    sigma: &'a Sigma,
    cond: Rho,
    clause: Rho,
}

impl<'a> PatUnifier<'a> {
    fn pats(&mut self, xs: &[Pat], ys: &[Pat]) -> bool {
        xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.pat(x, y))
    }

    fn pat(&mut self, x: &Pat, y: &Pat) -> bool {
        use Pat::*;
        match (x, y) {
            (Bind(v), y) => {
                self.cond.insert(v.clone(), y.to_term(self.sigma));
                true
            }
            (x, Bind(v)) => {
                self.clause.insert(v.clone(), x.to_term(self.sigma));
                true
            }
            (Lit(..), y) => match x.unfold_lit(self.sigma) {
                Some(x) => self.pat(&x, y),
                None => false,
            },
            (x, Lit(..)) => match y.unfold_lit(self.sigma) {
                Some(y) => self.pat(x, &y),
                None => false,
            },
            (Ctor(a), Ctor(b)) => a.ctor == b.ctor && self.pats(&a.args, &b.args),
            (Tuple(xs, _), Tuple(ys, _)) => self.pats(xs, ys),
            (Prim(a), Prim(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> Elaborator<'a> {
    /// For each constructor sub-pattern whose constructor has conditions,
    /// replay `clauses` at the clause's instance with the condition applied,
    /// and require the clause body there.
    pub fn conquer(
        &mut self,
        tele: &Tele<Term>,
        ret: &Term,
        clauses: &[Matching],
    ) -> Result<(), Error> {
        for m in clauses {
            let Some(body) = &m.body else {
                continue;
            };
            let mut found = Vec::default();
            for (i, p) in m.pats.iter().enumerate() {
                ctor_pats(p, vec![i], &mut found);
            }
            for (path, c) in found {
                let (data, conds) = match self.sigma.def(&c.ctor).map(|d| &d.body) {
                    Some(Body::Ctor(b)) if !b.clauses.is_empty() => (b.data.clone(), b.clauses.clone()),
                    _ => continue,
                };
                let data_tele = self
                    .sigma
                    .sig(&data)
                    .map(|s| s.tele.clone())
                    .unwrap_or_default();
                for cond in &conds {
                    let Some(cond_body) = &cond.body else {
                        continue;
                    };
                    let mut u = PatUnifier {
                        sigma: &*self.sigma,
                        cond: rho_of(&data_tele, &c.data.args),
                        clause: Default::default(),
                    };
                    if !u.pats(&cond.pats, &c.args) {
                        continue;
                    }
                    let (cond_rho, clause_rho) = (u.cond, u.clause);
                    let with = Subst::new(cond_rho)
                        .with_sort(&c.data.sort)
                        .renaming()
                        .term(cond_body.clone());

                    let mut s = Subst::new(clause_rho);
                    let args = m
                        .pats
                        .iter()
                        .enumerate()
                        .map(|(k, p)| {
                            if k == path[0] {
                                replace(p, &path[1..], &with, &*self.sigma)
                            } else {
                                p.to_term(&*self.sigma)
                            }
                        })
                        .collect::<Vec<_>>();
                    let args = args.into_iter().map(|t| s.term(t)).collect::<Vec<_>>();
                    let expected = s.term(body.clone());
                    let ty = Subst::tele(tele, &args).term(ret.clone());

                    let unfolded = self
                        .normalizer(m.loc)
                        .match_clauses(clauses, &args, &Sort::POLY)?;
                    let Some(actual) = unfolded else {
                        return Err(Error::ConditionsStuck {
                            expected: self.nf(expected, m.loc)?,
                            loc: m.loc,
                        });
                    };
                    let actual = self.nf(actual, m.loc)?;
                    if !self.unifier(m.loc).compare(&actual, &expected, &ty)? {
                        return Err(Error::Conditions {
                            expected: self.nf(expected, m.loc)?,
                            actual,
                            loc: m.loc,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
