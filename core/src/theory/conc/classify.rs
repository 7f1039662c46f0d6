use log::trace;

use crate::theory::abs::builtin::Prims;
use crate::theory::abs::data::{Call, ConCall, Term};
use crate::theory::abs::def::Body;
use crate::theory::abs::level::Sort;
use crate::theory::abs::normalize::Normalizer;
use crate::theory::abs::pat::{Matching, Pat};
use crate::theory::abs::subst::Subst;
use crate::theory::conc::elab::Elaborator;
use crate::theory::ParamInfo::Explicit;
use crate::theory::{Loc, Param, Tele, Var};
use crate::{maybe_grow, Error};

/// One leaf of the coverage tree: the clauses that match every value of
/// the shape `instance`, whose free variables are `vars`.
#[derive(Debug, Clone)]
pub struct PatClass {
    pub clauses: Vec<usize>,
    pub instance: Vec<Term>,
    pub vars: Tele<Term>,
}

#[derive(Debug, Clone)]
struct Row {
    index: usize,
    pats: Vec<Pat>,
}

/// Open columns of the clause matrix, with the rows still alive.
#[derive(Debug, Clone)]
struct Branch {
    instance: Vec<Term>,
    cols: Tele<Term>,
    rows: Vec<Row>,
}

fn splits(p: &Pat) -> bool {
    !matches!(p, Pat::Bind(_))
}

fn wildcards(n: usize) -> Vec<Pat> {
    (0..n).map(|_| Pat::Bind(Var::unbound())).collect()
}

pub struct Classifier<'a> {
    n: Normalizer<'a>,
    prims: &'a Prims,
    loc: Loc,
    coverage: bool,
    classes: Vec<PatClass>,
}

impl<'a> Classifier<'a> {
    pub fn new(n: Normalizer<'a>, prims: &'a Prims, loc: Loc) -> Self {
        Self {
            n,
            prims,
            loc,
            coverage: true,
            classes: Default::default(),
        }
    }

    /// Drop uncovered shapes instead of reporting them.
    pub fn partial(mut self) -> Self {
        self.coverage = false;
        self
    }

    /// Split the clause matrix into classes. An uncovered shape is a
    /// `MissingCase` unless the classifier is partial.
    pub fn classify(mut self, clauses: &[Matching], tele: &Tele<Term>) -> Result<Vec<PatClass>, Error> {
        let mut s = Subst::default();
        let mut cols = Tele::default();
        for p in tele {
            let x = Var::unbound();
            let ty = s.term(*p.typ.clone());
            s.insert(p.var.clone(), Term::Ref(x.clone()));
            cols.push(Param::new(x, p.info, ty));
        }
        let rows = clauses
            .iter()
            .enumerate()
            .map(|(index, m)| Row {
                index,
                pats: m.pats.clone(),
            })
            .collect();
        self.split(Branch {
            instance: Term::refs(&cols),
            cols,
            rows,
        })?;
        Ok(self.classes)
    }

    fn split(&mut self, b: Branch) -> Result<(), Error> {
        maybe_grow(move || self.split_impl(b))
    }

    fn split_impl(&mut self, b: Branch) -> Result<(), Error> {
        if b.rows.is_empty() {
            if !self.coverage {
                return Ok(());
            }
            let shape = b
                .instance
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::MissingCase(shape, self.loc));
        }
        let column = (0..b.cols.len()).find(|&j| b.rows.iter().any(|r| splits(&r.pats[j])));
        let Some(j) = column else {
            let clauses = b.rows.iter().map(|r| r.index).collect::<Vec<_>>();
            trace!("class {clauses:?} at {}", Term::Tuple(b.instance.clone()));
            self.classes.push(PatClass {
                clauses,
                instance: b.instance,
                vars: b.cols,
            });
            return Ok(());
        };

        match self.n.whnf(*b.cols[j].typ.clone())? {
            Term::DataCall(c) => {
                let ctors = match self.n.sigma().def(&c.def).map(|d| &d.body) {
                    Some(Body::Data(ctors)) => ctors.clone(),
                    _ => return Err(Error::NotYetTycked(c.def.clone(), self.loc)),
                };
                for ctor in ctors {
                    let (sub, con) = self.ctor_instance(&c, &ctor)?;
                    let rows = b
                        .rows
                        .iter()
                        .filter_map(|r| self.ctor_row(r, j, &ctor, sub.len()))
                        .collect();
                    self.split(Self::refine(&b, j, con, sub, rows))?;
                }
                Ok(())
            }
            Term::Sigma(tele) => {
                let mut s = Subst::default();
                let mut sub = Tele::default();
                for p in tele {
                    let y = Var::unbound();
                    let ty = s.term(*p.typ);
                    s.insert(p.var, Term::Ref(y.clone()));
                    sub.push(Param::new(y, Explicit, ty));
                }
                let rows = b
                    .rows
                    .iter()
                    .filter_map(|r| {
                        let subs = match &r.pats[j] {
                            Pat::Tuple(ps, _) => ps.clone(),
                            Pat::Bind(_) => wildcards(sub.len()),
                            _ => return None,
                        };
                        Some(Self::splice(r, j, subs))
                    })
                    .collect();
                let tuple = Term::Tuple(Term::refs(&sub));
                self.split(Self::refine(&b, j, tuple, sub, rows))
            }
            ty if self.prims.is_interval(&ty) => {
                let Some((left, right)) = self.prims.endpoints() else {
                    return Err(Error::NotSplittable(ty, self.loc));
                };
                for end in [left, right] {
                    let rows = b
                        .rows
                        .iter()
                        .filter(|r| match &r.pats[j] {
                            Pat::Prim(v) => v == &end,
                            p => !splits(p),
                        })
                        .map(|r| Self::splice(r, j, Default::default()))
                        .collect();
                    let tm = Term::PrimCall(Call::new(end, Sort::constant(0, 0), Default::default()));
                    self.split(Self::refine(&b, j, tm, Default::default(), rows))?;
                }
                Ok(())
            }
            ty => Err(Error::NotSplittable(ty, self.loc)),
        }
    }

    /// Columns for the arguments of `ctor` at the data instance `c`.
    fn ctor_instance(&self, c: &Call, ctor: &Var) -> Result<(Tele<Term>, Term), Error> {
        let sig = self
            .n
            .sigma()
            .sig(ctor)
            .ok_or_else(|| Error::NotYetTycked(ctor.clone(), self.loc))?
            .fresh(&c.sort);
        let sig = c.args.iter().fold(sig, |sig, a| sig.instantiate(a));
        let mut s = Subst::default();
        let mut sub = Tele::default();
        for p in sig.tele {
            let y = Var::unbound();
            let ty = s.term(*p.typ);
            s.insert(p.var, Term::Ref(y.clone()));
            sub.push(Param::new(y, p.info, ty));
        }
        let con = Term::ConCall(ConCall {
            data: c.clone(),
            ctor: ctor.clone(),
            args: Term::refs(&sub),
        });
        Ok((sub, con))
    }

    fn ctor_row(&self, r: &Row, j: usize, ctor: &Var, arity: usize) -> Option<Row> {
        let p = &r.pats[j];
        let p = p.unfold_lit(self.n.sigma()).unwrap_or_else(|| p.clone());
        let subs = match p {
            Pat::Ctor(c) if &c.ctor == ctor => c.args,
            Pat::Bind(_) => wildcards(arity),
            _ => return None,
        };
        Some(Self::splice(r, j, subs))
    }

    fn splice(r: &Row, j: usize, subs: Vec<Pat>) -> Row {
        let mut pats = r.pats[..j].to_vec();
        pats.extend(subs);
        pats.extend_from_slice(&r.pats[j + 1..]);
        Row {
            index: r.index,
            pats,
        }
    }

    /// Replace column `j` by `sub`, and its variable by `tm` everywhere.
    fn refine(b: &Branch, j: usize, tm: Term, sub: Tele<Term>, rows: Vec<Row>) -> Branch {
        let mut s = Subst::single(&b.cols[j].var, tm);
        let instance = b.instance.iter().map(|t| s.term(t.clone())).collect();
        let mut cols = b.cols[..j].to_vec();
        cols.extend(sub);
        cols.extend(s.params(b.cols[j + 1..].to_vec()));
        Branch { instance, cols, rows }
    }
}

impl<'a> Elaborator<'a> {
    /// Classify `clauses`, warn about clauses that can never fire, and check
    /// that overlapping clauses agree on each class.
    pub fn coverage(
        &mut self,
        tele: &Tele<Term>,
        ret: &Term,
        clauses: &[Matching],
        loc: Loc,
    ) -> Result<Vec<PatClass>, Error> {
        let classes = Classifier::new(self.normalizer(loc), &*self.prims, loc).classify(clauses, tele)?;
        for (i, m) in clauses.iter().enumerate() {
            if m.body.is_none() {
                continue;
            }
            let shadowed = clauses[..i]
                .iter()
                .any(|e| e.body.is_some() && Pat::all_subsume(&e.pats, &m.pats, &*self.sigma));
            if shadowed || !classes.iter().any(|c| c.clauses.contains(&i)) {
                self.problems.push(Error::RedundantClause(m.loc));
            }
        }
        self.confluent(tele, ret, clauses, &classes)?;
        Ok(classes)
    }

    /// Overlap confluence alone, for clauses that need not cover their
    /// telescope, such as constructor conditions.
    pub fn ensure_confluent(
        &mut self,
        tele: &Tele<Term>,
        ret: &Term,
        clauses: &[Matching],
        loc: Loc,
    ) -> Result<(), Error> {
        let classes = Classifier::new(self.normalizer(loc), &*self.prims, loc)
            .partial()
            .classify(clauses, tele)?;
        self.confluent(tele, ret, clauses, &classes)
    }

    fn confluent(
        &mut self,
        tele: &Tele<Term>,
        ret: &Term,
        clauses: &[Matching],
        classes: &[PatClass],
    ) -> Result<(), Error> {
        for class in classes.iter().filter(|c| c.clauses.len() > 1) {
            self.confluence(tele, ret, clauses, class)?;
        }
        Ok(())
    }

    fn confluence(
        &mut self,
        tele: &Tele<Term>,
        ret: &Term,
        clauses: &[Matching],
        class: &PatClass,
    ) -> Result<(), Error> {
        let ty = Subst::tele(tele, &class.instance).term(ret.clone());
        self.scoped(|el| {
            for p in &class.vars {
                el.ctx.put(p.var.clone(), *p.typ.clone());
            }
            let mut first: Option<Term> = None;
            for &i in &class.clauses {
                let m = &clauses[i];
                let n = el.normalizer(m.loc);
                let Some(body) = n.match_clauses(std::slice::from_ref(m), &class.instance, &Sort::POLY)? else {
                    continue;
                };
                let expected = match first.clone() {
                    Some(e) => e,
                    None => {
                        first = Some(body);
                        continue;
                    }
                };
                if !el.unifier(m.loc).compare(&body, &expected, &ty)? {
                    return Err(Error::Confluence {
                        lhs: el.nf(expected, m.loc)?,
                        rhs: el.nf(body, m.loc)?,
                        loc: m.loc,
                    });
                }
            }
            Ok(())
        })
    }
}
