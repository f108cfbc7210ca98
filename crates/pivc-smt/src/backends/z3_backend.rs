use indexmap::IndexMap;
use num::Signed;
use thiserror::Error;
use tracing::debug;
use z3::ast::{Array, Ast, Bool, Int, Real};
use z3::SatResult as Z3SatResult;

use crate::solver::{Model, SatResult, SmtSolver};
use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

#[derive(Debug, Error)]
pub enum Z3Error {
    #[error("Z3 error: {0}")]
    Internal(String),
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Sort mismatch for variable {0}")]
    SortMismatch(String),
}

/// In-process Z3 backend.
///
/// Declared constants are kept in declaration order so that extracted
/// models list them the same way on every run.
pub struct Z3Solver {
    solver: z3::Solver,
    consts: IndexMap<String, (SmtSort, Z3Term)>,
}

impl Z3Solver {
    pub fn new() -> Self {
        Self {
            solver: z3::Solver::new(),
            consts: IndexMap::new(),
        }
    }

    fn translate_term(&self, term: &SmtTerm, bound: &mut Vec<(String, Z3Term)>) -> Result<Z3Term, Z3Error> {
        match term {
            SmtTerm::Var(name, sort) => {
                if let Some((_, v)) = bound.iter().rev().find(|(b, _)| b == name) {
                    return Ok(v.clone());
                }
                match self.consts.get(name) {
                    Some((declared, v)) if declared == sort => Ok(v.clone()),
                    Some(_) => Err(Z3Error::SortMismatch(name.clone())),
                    None => Err(Z3Error::UnknownVariable(name.clone())),
                }
            }
            SmtTerm::IntLit(n) => Ok(Z3Term::Int(Int::from_i64(*n))),
            SmtTerm::RealLit(value) => {
                let magnitude = Real::from_big_rational(&value.abs());
                if value.is_negative() {
                    Ok(Z3Term::Real(magnitude.unary_minus()))
                } else {
                    Ok(Z3Term::Real(magnitude))
                }
            }
            SmtTerm::BoolLit(b) => Ok(Z3Term::Bool(Bool::from_bool(*b))),

            SmtTerm::Add(lhs, rhs) => arith(
                self.translate_term(lhs, bound)?,
                self.translate_term(rhs, bound)?,
                |l, r| &l + &r,
                |l, r| &l + &r,
            ),
            SmtTerm::Sub(lhs, rhs) => arith(
                self.translate_term(lhs, bound)?,
                self.translate_term(rhs, bound)?,
                |l, r| &l - &r,
                |l, r| &l - &r,
            ),
            SmtTerm::Mul(lhs, rhs) => arith(
                self.translate_term(lhs, bound)?,
                self.translate_term(rhs, bound)?,
                |l, r| &l * &r,
                |l, r| &l * &r,
            ),
            SmtTerm::IntDiv(lhs, rhs) => {
                let l = self.translate_term(lhs, bound)?.into_int()?;
                let r = self.translate_term(rhs, bound)?.into_int()?;
                Ok(Z3Term::Int(l.div(&r)))
            }
            SmtTerm::RealDiv(lhs, rhs) => {
                let l = self.translate_term(lhs, bound)?.into_real()?;
                let r = self.translate_term(rhs, bound)?.into_real()?;
                Ok(Z3Term::Real(l.div(&r)))
            }
            SmtTerm::Mod(lhs, rhs) => {
                let l = self.translate_term(lhs, bound)?.into_int()?;
                let r = self.translate_term(rhs, bound)?.into_int()?;
                Ok(Z3Term::Int(l.modulo(&r)))
            }
            SmtTerm::Neg(inner) => match self.translate_term(inner, bound)? {
                Z3Term::Int(i) => Ok(Z3Term::Int(i.unary_minus())),
                Z3Term::Real(r) => Ok(Z3Term::Real(r.unary_minus())),
                _ => Err(Z3Error::Internal("Expected arithmetic operand in Neg".into())),
            },
            SmtTerm::ToReal(inner) => {
                let i = self.translate_term(inner, bound)?.into_int()?;
                Ok(Z3Term::Real(Real::from_int(&i)))
            }

            SmtTerm::Eq(lhs, rhs) => {
                let l = self.translate_term(lhs, bound)?;
                let r = self.translate_term(rhs, bound)?;
                match (l, r) {
                    (Z3Term::Int(l), Z3Term::Int(r)) => Ok(Z3Term::Bool(l.eq(&r))),
                    (Z3Term::Real(l), Z3Term::Real(r)) => Ok(Z3Term::Bool(l.eq(&r))),
                    (Z3Term::Bool(l), Z3Term::Bool(r)) => Ok(Z3Term::Bool(l.eq(&r))),
                    (Z3Term::Array(l, le), Z3Term::Array(r, re)) if le == re => {
                        Ok(Z3Term::Bool(l.eq(&r)))
                    }
                    _ => Err(Z3Error::Internal("Sort mismatch in Eq".into())),
                }
            }
            SmtTerm::Lt(lhs, rhs) => compare(
                self.translate_term(lhs, bound)?,
                self.translate_term(rhs, bound)?,
                |l, r| l.lt(&r),
                |l, r| l.lt(&r),
            ),
            SmtTerm::Le(lhs, rhs) => compare(
                self.translate_term(lhs, bound)?,
                self.translate_term(rhs, bound)?,
                |l, r| l.le(&r),
                |l, r| l.le(&r),
            ),
            SmtTerm::Gt(lhs, rhs) => compare(
                self.translate_term(lhs, bound)?,
                self.translate_term(rhs, bound)?,
                |l, r| l.gt(&r),
                |l, r| l.gt(&r),
            ),
            SmtTerm::Ge(lhs, rhs) => compare(
                self.translate_term(lhs, bound)?,
                self.translate_term(rhs, bound)?,
                |l, r| l.ge(&r),
                |l, r| l.ge(&r),
            ),

            SmtTerm::And(terms) => {
                let bools = terms
                    .iter()
                    .map(|t| self.translate_term(t, bound).and_then(Z3Term::into_bool))
                    .collect::<Result<Vec<_>, _>>()?;
                let refs: Vec<&Bool> = bools.iter().collect();
                Ok(Z3Term::Bool(Bool::and(&refs)))
            }
            SmtTerm::Or(terms) => {
                let bools = terms
                    .iter()
                    .map(|t| self.translate_term(t, bound).and_then(Z3Term::into_bool))
                    .collect::<Result<Vec<_>, _>>()?;
                let refs: Vec<&Bool> = bools.iter().collect();
                Ok(Z3Term::Bool(Bool::or(&refs)))
            }
            SmtTerm::Not(inner) => {
                let b = self.translate_term(inner, bound)?.into_bool()?;
                Ok(Z3Term::Bool(b.not()))
            }
            SmtTerm::Implies(lhs, rhs) => {
                let l = self.translate_term(lhs, bound)?.into_bool()?;
                let r = self.translate_term(rhs, bound)?.into_bool()?;
                Ok(Z3Term::Bool(l.implies(&r)))
            }
            SmtTerm::Iff(lhs, rhs) => {
                let l = self.translate_term(lhs, bound)?.into_bool()?;
                let r = self.translate_term(rhs, bound)?.into_bool()?;
                Ok(Z3Term::Bool(l.eq(&r)))
            }

            SmtTerm::Select(array, index) => {
                let (a, element) = self.translate_term(array, bound)?.into_array()?;
                let i = self.translate_term(index, bound)?.into_int()?;
                let value = a.select(&i);
                let term = match &element {
                    SmtSort::Int => value.as_int().map(Z3Term::Int),
                    SmtSort::Real => value.as_real().map(Z3Term::Real),
                    SmtSort::Bool => value.as_bool().map(Z3Term::Bool),
                    SmtSort::Array(inner) => value
                        .as_array()
                        .map(|arr| Z3Term::Array(arr, inner.as_ref().clone())),
                };
                term.ok_or_else(|| Z3Error::Internal(format!("Select did not yield {element}")))
            }
            SmtTerm::Store(array, index, value) => {
                let (a, element) = self.translate_term(array, bound)?.into_array()?;
                let i = self.translate_term(index, bound)?.into_int()?;
                let stored = match (self.translate_term(value, bound)?, &element) {
                    (Z3Term::Int(v), SmtSort::Int) => a.store(&i, &v),
                    (Z3Term::Real(v), SmtSort::Real) => a.store(&i, &v),
                    (Z3Term::Bool(v), SmtSort::Bool) => a.store(&i, &v),
                    (Z3Term::Array(v, ve), SmtSort::Array(inner)) if ve == **inner => a.store(&i, &v),
                    _ => return Err(Z3Error::Internal("Sort mismatch in Store".into())),
                };
                Ok(Z3Term::Array(stored, element))
            }

            SmtTerm::ForAll(bindings, body) | SmtTerm::Exists(bindings, body) => {
                let depth = bound.len();
                for (name, sort) in bindings {
                    bound.push((name.clone(), Z3Term::fresh_const(name, sort)));
                }
                let body_result = self.translate_term(body, bound).and_then(Z3Term::into_bool);
                let vars: Vec<Z3Term> = bound.drain(depth..).map(|(_, v)| v).collect();
                let body = body_result?;
                let refs: Vec<&dyn Ast> = vars.iter().map(Z3Term::as_ast).collect();
                let q = if matches!(term, SmtTerm::ForAll(_, _)) {
                    z3::ast::forall_const(&refs, &[], &body)
                } else {
                    z3::ast::exists_const(&refs, &[], &body)
                };
                Ok(Z3Term::Bool(q))
            }
        }
    }

    fn extract_model(&self, z3_model: &z3::Model) -> Model {
        let mut model = Model::default();
        for (name, (_, value)) in &self.consts {
            let rendered = match value {
                Z3Term::Int(v) => z3_model.eval(v, true).map(|v| v.to_string()),
                Z3Term::Real(v) => z3_model.eval(v, true).map(|v| v.to_string()),
                Z3Term::Bool(v) => z3_model.eval(v, true).map(|v| v.to_string()),
                Z3Term::Array(v, _) => z3_model.eval(v, true).map(|v| v.to_string()),
            };
            if let Some(rendered) = rendered {
                model.values.insert(name.clone(), rendered);
            }
        }
        model
    }

    fn unknown_reason(&self) -> String {
        self.solver
            .get_reason_unknown()
            .unwrap_or_else(|| "Z3 returned unknown".into())
    }
}

#[derive(Clone)]
enum Z3Term {
    Int(Int),
    Real(Real),
    Bool(Bool),
    /// Array together with its element sort.
    Array(Array, SmtSort),
}

impl Z3Term {
    fn fresh_const(name: &str, sort: &SmtSort) -> Self {
        match sort {
            SmtSort::Int => Z3Term::Int(Int::new_const(name)),
            SmtSort::Real => Z3Term::Real(Real::new_const(name)),
            SmtSort::Bool => Z3Term::Bool(Bool::new_const(name)),
            SmtSort::Array(element) => Z3Term::Array(
                Array::new_const(name, &z3::Sort::int(), &z3_sort(element)),
                element.as_ref().clone(),
            ),
        }
    }

    fn as_ast(&self) -> &dyn Ast {
        match self {
            Z3Term::Int(v) => v,
            Z3Term::Real(v) => v,
            Z3Term::Bool(v) => v,
            Z3Term::Array(v, _) => v,
        }
    }

    fn into_int(self) -> Result<Int, Z3Error> {
        match self {
            Z3Term::Int(i) => Ok(i),
            _ => Err(Z3Error::Internal("Expected Int operand".into())),
        }
    }

    fn into_real(self) -> Result<Real, Z3Error> {
        match self {
            Z3Term::Real(r) => Ok(r),
            _ => Err(Z3Error::Internal("Expected Real operand".into())),
        }
    }

    fn into_bool(self) -> Result<Bool, Z3Error> {
        match self {
            Z3Term::Bool(b) => Ok(b),
            _ => Err(Z3Error::Internal("Expected Bool operand".into())),
        }
    }

    fn into_array(self) -> Result<(Array, SmtSort), Z3Error> {
        match self {
            Z3Term::Array(a, element) => Ok((a, element)),
            _ => Err(Z3Error::Internal("Expected Array operand".into())),
        }
    }
}

fn z3_sort(sort: &SmtSort) -> z3::Sort {
    match sort {
        SmtSort::Bool => z3::Sort::bool(),
        SmtSort::Int => z3::Sort::int(),
        SmtSort::Real => z3::Sort::real(),
        SmtSort::Array(element) => z3::Sort::array(&z3::Sort::int(), &z3_sort(element)),
    }
}

fn arith(
    l: Z3Term,
    r: Z3Term,
    int_op: impl FnOnce(Int, Int) -> Int,
    real_op: impl FnOnce(Real, Real) -> Real,
) -> Result<Z3Term, Z3Error> {
    match (l, r) {
        (Z3Term::Int(l), Z3Term::Int(r)) => Ok(Z3Term::Int(int_op(l, r))),
        (Z3Term::Real(l), Z3Term::Real(r)) => Ok(Z3Term::Real(real_op(l, r))),
        _ => Err(Z3Error::Internal("Sort mismatch in arithmetic".into())),
    }
}

fn compare(
    l: Z3Term,
    r: Z3Term,
    int_op: impl FnOnce(Int, Int) -> Bool,
    real_op: impl FnOnce(Real, Real) -> Bool,
) -> Result<Z3Term, Z3Error> {
    match (l, r) {
        (Z3Term::Int(l), Z3Term::Int(r)) => Ok(Z3Term::Bool(int_op(l, r))),
        (Z3Term::Real(l), Z3Term::Real(r)) => Ok(Z3Term::Bool(real_op(l, r))),
        _ => Err(Z3Error::Internal("Sort mismatch in comparison".into())),
    }
}

impl Default for Z3Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtSolver for Z3Solver {
    type Error = Z3Error;

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Z3Error> {
        if let Some((declared, _)) = self.consts.get(name) {
            if declared != sort {
                return Err(Z3Error::SortMismatch(name.to_string()));
            }
            return Ok(());
        }
        self.consts
            .insert(name.to_string(), (sort.clone(), Z3Term::fresh_const(name, sort)));
        Ok(())
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Z3Error> {
        let z3_term = self.translate_term(term, &mut Vec::new())?.into_bool()?;
        self.solver.assert(&z3_term);
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Z3Error> {
        match self.solver.check() {
            Z3SatResult::Sat => Ok(SatResult::Sat),
            Z3SatResult::Unsat => Ok(SatResult::Unsat),
            Z3SatResult::Unknown => Ok(SatResult::Unknown(self.unknown_reason())),
        }
    }

    fn check_sat_with_model(&mut self) -> Result<(SatResult, Option<Model>), Z3Error> {
        let result = self.check_sat()?;
        debug!(result = ?result, consts = self.consts.len(), "z3 check");
        match result {
            SatResult::Sat => {
                let z3_model = self
                    .solver
                    .get_model()
                    .ok_or_else(|| Z3Error::Internal("SAT but no model available".into()))?;
                Ok((SatResult::Sat, Some(self.extract_model(&z3_model))))
            }
            SatResult::Unsat => Ok((SatResult::Unsat, None)),
            unknown @ SatResult::Unknown(_) => {
                let model = self.solver.get_model().map(|m| self.extract_model(&m));
                Ok((unknown, model))
            }
        }
    }

    fn reset(&mut self) -> Result<(), Z3Error> {
        self.solver.reset();
        self.consts.clear();
        Ok(())
    }
}
