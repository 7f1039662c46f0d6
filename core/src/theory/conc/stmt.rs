use log::debug;

use crate::theory::abs::data::{Call, Term};
use crate::theory::abs::def::{Body, CtorBody, Def, FieldBody, Head, Signature};
use crate::theory::abs::level::Sort;
use crate::theory::abs::zonk::Zonker;
use crate::theory::conc::data::Expr;
use crate::theory::conc::elab::Elaborator;
use crate::theory::conc::terck;
use crate::theory::ParamInfo::{Explicit, Implicit};
use crate::theory::{Loc, Param, Tele, Var};
use crate::Error;

/// A unit of checking: everything in it is published together.
#[derive(Debug, Clone)]
pub enum Decl {
    Fn(Def<Expr>),
    Data(Def<Expr>, Vec<Def<Expr>>),
    Struct(Def<Expr>, Vec<Def<Expr>>),
    Prim(Def<Expr>),
}

impl Decl {
    pub fn def(&self) -> &Def<Expr> {
        match self {
            Decl::Fn(d) | Decl::Data(d, _) | Decl::Struct(d, _) | Decl::Prim(d) => d,
        }
    }

    /// Attach constructors to their data type and fields to their struct.
    pub fn group(defs: Vec<Def<Expr>>) -> (Vec<Decl>, Vec<Error>) {
        let mut decls = Vec::default();
        let mut errors = Vec::default();
        let mut it = defs.into_iter().peekable();
        while let Some(d) = it.next() {
            let members = match &d.body {
                Body::Data(names) | Body::Struct(names) => names.clone(),
                Body::Ctor(_) | Body::Field(_) => {
                    errors.push(Error::Orphan(d.name.clone(), d.loc));
                    continue;
                }
                Body::Prim => {
                    decls.push(Decl::Prim(d));
                    continue;
                }
                _ => {
                    decls.push(Decl::Fn(d));
                    continue;
                }
            };
            let mut found = Vec::default();
            while let Some(m) = it.next_if(|m| members.contains(&m.name)) {
                found.push(m);
            }
            if let Some(n) = members.iter().find(|n| !found.iter().any(|m| &m.name == *n)) {
                errors.push(Error::MissingMember(n.clone(), d.loc));
                continue;
            }
            decls.push(match d.body {
                Body::Data(_) => Decl::Data(d, found),
                _ => Decl::Struct(d, found),
            });
        }
        (decls, errors)
    }
}

fn implicit(tele: &Tele<Term>) -> Tele<Term> {
    tele.iter()
        .map(|p| Param::new(p.var.clone(), Implicit, *p.typ.clone()))
        .collect()
}

/// The universe instance a definition uses for itself.
fn own_sort(sig: &Signature) -> Sort {
    if sig.is_polymorphic() {
        Sort::POLY
    } else {
        Sort::constant(0, 0)
    }
}

impl<'a> Elaborator<'a> {
    pub fn decl(&mut self, d: Decl) -> Result<(), Error> {
        debug!("checking {}", d.def().name);
        let loc = d.def().loc;
        match d {
            Decl::Fn(d) => self.fn_decl(d)?,
            Decl::Data(d, ctors) => self.data_decl(d, ctors)?,
            Decl::Struct(d, fields) => self.struct_decl(d, fields)?,
            Decl::Prim(d) => return self.prim_decl(d),
        }
        self.publish(loc)
    }

    fn sort_of_ret(&mut self, ret: Expr) -> Result<(Term, Sort), Error> {
        let loc = ret.loc();
        let (ret, _) = self.check_type(ret)?;
        match self.whnf(ret.clone(), loc)? {
            Term::Univ(s) => Ok((ret, s)),
            ty => Err(Error::ExpectedUniv(ty, loc)),
        }
    }

    fn fn_decl(&mut self, d: Def<Expr>) -> Result<(), Error> {
        let Def {
            loc,
            name,
            tele,
            ret,
            body,
        } = d;
        self.scoped(|el| {
            let tele = el.check_tele(tele)?;
            let (ret, _) = el.check_type(*ret)?;
            let sig = Signature::new(Head::Fn, tele.clone(), ret.clone());
            el.sigma.stage_sig(name.clone(), sig);

            let def = |body| Def {
                loc,
                name: name.clone(),
                tele: tele.clone(),
                ret: Box::new(ret.clone()),
                body,
            };
            let body = match body {
                Body::Fn(e) => {
                    let (tm, _) = el.check(e, &ret)?;
                    terck::body(&name, &tm, loc)?;
                    Body::Fn(tm)
                }
                Body::Clauses(cs) => {
                    let ms = cs
                        .into_iter()
                        .map(|c| el.clause(&tele, &ret, c))
                        .collect::<Result<Vec<_>, _>>()?;
                    terck::clauses(&name, &ms)?;
                    el.sigma.stage_def(def(Body::Clauses(ms.clone())));
                    el.coverage(&tele, &ret, &ms, loc)?;
                    el.conquer(&tele, &ret, &ms)?;
                    Body::Clauses(ms)
                }
                Body::Postulate => Body::Postulate,
                _ => unreachable!(),
            };
            el.sigma.stage_def(def(body));
            Ok(())
        })
    }

    fn data_decl(&mut self, d: Def<Expr>, ctors: Vec<Def<Expr>>) -> Result<(), Error> {
        let Def {
            loc,
            name,
            tele,
            ret,
            ..
        } = d;
        self.scoped(|el| {
            let tele = el.check_tele(tele)?;
            let (ret, sort) = el.sort_of_ret(*ret)?;
            let sig = Signature::new(Head::Data, tele.clone(), ret.clone());
            let this = Term::DataCall(Call::new(name.clone(), own_sort(&sig), Term::refs(&tele)));
            el.sigma.stage_sig(name.clone(), sig);

            let names = ctors.iter().map(|c| c.name.clone()).collect::<Vec<_>>();
            el.sigma.stage_def(Def {
                loc,
                name: name.clone(),
                tele: tele.clone(),
                ret: Box::new(ret.clone()),
                body: Body::Data(names),
            });
            for c in ctors {
                el.ctor_decl(&name, &tele, &this, &sort, c)?;
            }
            Ok(())
        })
    }

    fn ctor_decl(
        &mut self,
        data: &Var,
        data_tele: &Tele<Term>,
        this: &Term,
        sort: &Sort,
        d: Def<Expr>,
    ) -> Result<(), Error> {
        let Def {
            loc, name, tele, body, ..
        } = d;
        let Body::Ctor(b) = body else {
            return Err(Error::Orphan(name, loc));
        };
        self.scoped(|el| {
            let mut checked = Tele::default();
            for p in tele {
                let ploc = p.typ.loc();
                let (typ, s) = el.check_type(*p.typ)?;
                el.subtype(&Term::Univ(s), &Term::Univ(sort.clone()), ploc)?;
                el.ctx.put(p.var.clone(), typ.clone());
                checked.push(Param::new(p.var, p.info, typ));
            }
            el.sigma.stage_sig(
                name.clone(),
                Signature {
                    head: Head::Ctor(data.clone()),
                    ctx: implicit(data_tele),
                    tele: checked.clone(),
                    result: this.clone(),
                },
            );
            let clauses = b
                .clauses
                .into_iter()
                .map(|c| el.clause(&checked, this, c))
                .collect::<Result<Vec<_>, _>>()?;
            el.ensure_confluent(&checked, this, &clauses, loc)?;
            el.conquer(&checked, this, &clauses)?;
            el.sigma.stage_def(Def {
                loc,
                name: name.clone(),
                tele: checked,
                ret: Box::new(this.clone()),
                body: Body::Ctor(CtorBody {
                    data: data.clone(),
                    clauses,
                }),
            });
            Ok(())
        })
    }

    fn struct_decl(&mut self, d: Def<Expr>, fields: Vec<Def<Expr>>) -> Result<(), Error> {
        let Def {
            loc,
            name,
            tele,
            ret,
            ..
        } = d;
        self.scoped(|el| {
            let tele = el.check_tele(tele)?;
            let (ret, sort) = el.sort_of_ret(*ret)?;
            let sig = Signature::new(Head::Struct, tele.clone(), ret.clone());
            let this = Term::StructCall(Call::new(name.clone(), own_sort(&sig), Term::refs(&tele)));
            el.sigma.stage_sig(name.clone(), sig);

            let names = fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>();
            for f in fields {
                el.field_decl(&name, &tele, &this, &sort, f)?;
            }
            el.sigma.stage_def(Def {
                loc,
                name: name.clone(),
                tele,
                ret: Box::new(ret),
                body: Body::Struct(names),
            });
            Ok(())
        })
    }

    fn field_decl(
        &mut self,
        structure: &Var,
        struct_tele: &Tele<Term>,
        this: &Term,
        sort: &Sort,
        d: Def<Expr>,
    ) -> Result<(), Error> {
        let Def {
            loc,
            name,
            tele,
            ret,
            body,
        } = d;
        let Body::Field(b) = body else {
            return Err(Error::Orphan(name, loc));
        };
        self.scoped(|el| {
            let own = el.check_tele(tele)?;
            let rloc = ret.loc();
            let (typ, s) = el.check_type(*ret)?;
            el.subtype(&Term::Univ(s), &Term::Univ(sort.clone()), rloc)?;
            let default = match b.default {
                Some(e) => Some(Term::lam(&own, el.check(e, &typ)?.0)),
                None => None,
            };

            let mut full = vec![Param::new(Var::new("self"), Explicit, this.clone())];
            full.extend(own.iter().cloned());
            el.sigma.stage_sig(
                name.clone(),
                Signature {
                    head: Head::Field(structure.clone()),
                    ctx: implicit(struct_tele),
                    tele: full,
                    result: typ.clone(),
                },
            );
            el.sigma.stage_def(Def {
                loc,
                name,
                tele: own,
                ret: Box::new(typ),
                body: Body::Field(FieldBody {
                    structure: structure.clone(),
                    default,
                }),
            });
            Ok(())
        })
    }

    /// A primitive must agree with the registry's factory. It is usable
    /// only once published.
    fn prim_decl(&mut self, d: Def<Expr>) -> Result<(), Error> {
        let Def {
            loc,
            name,
            tele,
            ret,
            ..
        } = d;
        let (id, expected_tele, expected_ret) = self.prims.factory(&name, loc)?;
        self.scoped(|el| {
            let tele = el.check_tele(tele)?;
            let (ret, _) = el.check_type(*ret)?;
            let actual = Term::pi(&tele, ret.clone());
            let expected = Term::pi(&expected_tele, expected_ret);
            el.unify(&actual, &expected, &Term::omega(), loc)?;
            el.sigma
                .stage_sig(name.clone(), Signature::new(Head::Prim, tele.clone(), ret.clone()));
            el.sigma.stage_def(Def {
                loc,
                name: name.clone(),
                tele,
                ret: Box::new(ret),
                body: Body::Prim,
            });
            Ok(())
        })?;
        self.publish(loc)?;
        self.prims.declare(id, name);
        Ok(())
    }

    /// Solve what is left, then replace every staged entry by its zonked
    /// form. The first unsolved hole or level is fatal, the rest are
    /// reported alongside it.
    fn publish(&mut self, loc: Loc) -> Result<(), Error> {
        self.unifier(loc).solve_deferred()?;
        let levels = self.state.levels.solve()?;
        let mut z = Zonker::new(&self.state.metas, &levels, loc);
        for v in self.sigma.staged().to_vec() {
            if let Some(sig) = self.sigma.sig(&v).cloned() {
                self.sigma.stage_sig(v.clone(), z.sig(sig));
            }
            if let Some(def) = self.sigma.def(&v).cloned() {
                self.sigma.stage_def(z.def(def));
            }
        }
        let mut errors = z.finish();
        if errors.is_empty() {
            return Ok(());
        }
        let first = errors.remove(0);
        self.problems.extend(errors);
        Err(first)
    }
}
