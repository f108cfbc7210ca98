//! Truth-preserving structural simplification of [`SmtTerm`]s.
//!
//! Applied to a goal before it is negated and sent to the solver:
//!
//! - boolean literal folding and identity elimination
//! - double negation elimination
//! - integer literal folding (checked; overflow leaves the term alone)
//! - comparisons between integer literals
//!
//! Division and modulo are never folded: their value at a zero divisor is
//! left to the solver.

use crate::terms::SmtTerm;

/// Simplify a term recursively. The result is equivalent to the input and
/// has the same sort.
pub fn simplify(term: &SmtTerm) -> SmtTerm {
    match term {
        SmtTerm::Var(_, _) | SmtTerm::IntLit(_) | SmtTerm::RealLit(_) | SmtTerm::BoolLit(_) => {
            term.clone()
        }

        SmtTerm::Not(inner) => match simplify(inner) {
            SmtTerm::BoolLit(b) => SmtTerm::BoolLit(!b),
            SmtTerm::Not(inner2) => *inner2,
            other => other.not(),
        },

        SmtTerm::And(terms) => {
            let simplified: Vec<SmtTerm> = terms.iter().map(simplify).collect();
            if simplified.iter().any(|t| matches!(t, SmtTerm::BoolLit(false))) {
                return SmtTerm::BoolLit(false);
            }
            let mut filtered: Vec<SmtTerm> = simplified
                .into_iter()
                .filter(|t| !matches!(t, SmtTerm::BoolLit(true)))
                .collect();
            match filtered.len() {
                0 => SmtTerm::BoolLit(true),
                1 => filtered.remove(0),
                _ => SmtTerm::And(filtered),
            }
        }

        SmtTerm::Or(terms) => {
            let simplified: Vec<SmtTerm> = terms.iter().map(simplify).collect();
            if simplified.iter().any(|t| matches!(t, SmtTerm::BoolLit(true))) {
                return SmtTerm::BoolLit(true);
            }
            let mut filtered: Vec<SmtTerm> = simplified
                .into_iter()
                .filter(|t| !matches!(t, SmtTerm::BoolLit(false)))
                .collect();
            match filtered.len() {
                0 => SmtTerm::BoolLit(false),
                1 => filtered.remove(0),
                _ => SmtTerm::Or(filtered),
            }
        }

        SmtTerm::Implies(lhs, rhs) => match (simplify(lhs), simplify(rhs)) {
            (SmtTerm::BoolLit(false), _) | (_, SmtTerm::BoolLit(true)) => SmtTerm::BoolLit(true),
            (SmtTerm::BoolLit(true), r) => r,
            (l, SmtTerm::BoolLit(false)) => simplify(&l.not()),
            (l, r) => l.implies(r),
        },

        SmtTerm::Iff(lhs, rhs) => match (simplify(lhs), simplify(rhs)) {
            (SmtTerm::BoolLit(a), SmtTerm::BoolLit(b)) => SmtTerm::BoolLit(a == b),
            (SmtTerm::BoolLit(true), other) | (other, SmtTerm::BoolLit(true)) => other,
            (l, r) => l.iff(r),
        },

        SmtTerm::Add(lhs, rhs) => fold_int(simplify(lhs), simplify(rhs), i64::checked_add, SmtTerm::add),
        SmtTerm::Sub(lhs, rhs) => fold_int(simplify(lhs), simplify(rhs), i64::checked_sub, SmtTerm::sub),
        SmtTerm::Mul(lhs, rhs) => fold_int(simplify(lhs), simplify(rhs), i64::checked_mul, SmtTerm::mul),
        SmtTerm::Neg(inner) => match simplify(inner) {
            SmtTerm::IntLit(n) => match n.checked_neg() {
                Some(m) => SmtTerm::IntLit(m),
                None => SmtTerm::IntLit(n).neg(),
            },
            SmtTerm::Neg(inner2) => *inner2,
            other => other.neg(),
        },
        SmtTerm::IntDiv(lhs, rhs) => SmtTerm::IntDiv(Box::new(simplify(lhs)), Box::new(simplify(rhs))),
        SmtTerm::RealDiv(lhs, rhs) => {
            SmtTerm::RealDiv(Box::new(simplify(lhs)), Box::new(simplify(rhs)))
        }
        SmtTerm::Mod(lhs, rhs) => SmtTerm::Mod(Box::new(simplify(lhs)), Box::new(simplify(rhs))),
        SmtTerm::ToReal(inner) => SmtTerm::ToReal(Box::new(simplify(inner))),

        SmtTerm::Eq(lhs, rhs) => compare(simplify(lhs), simplify(rhs), |a, b| a == b, SmtTerm::eq),
        SmtTerm::Lt(lhs, rhs) => compare(simplify(lhs), simplify(rhs), |a, b| a < b, SmtTerm::lt),
        SmtTerm::Le(lhs, rhs) => compare(simplify(lhs), simplify(rhs), |a, b| a <= b, SmtTerm::le),
        SmtTerm::Gt(lhs, rhs) => compare(simplify(lhs), simplify(rhs), |a, b| a > b, SmtTerm::gt),
        SmtTerm::Ge(lhs, rhs) => compare(simplify(lhs), simplify(rhs), |a, b| a >= b, SmtTerm::ge),

        SmtTerm::Select(array, index) => simplify(array).select(simplify(index)),
        SmtTerm::Store(array, index, value) => {
            simplify(array).store(simplify(index), simplify(value))
        }

        SmtTerm::ForAll(bindings, body) => match simplify(body) {
            lit @ SmtTerm::BoolLit(_) => lit,
            body => SmtTerm::ForAll(bindings.clone(), Box::new(body)),
        },
        SmtTerm::Exists(bindings, body) => match simplify(body) {
            lit @ SmtTerm::BoolLit(_) => lit,
            body => SmtTerm::Exists(bindings.clone(), Box::new(body)),
        },
    }
}

fn fold_int(
    lhs: SmtTerm,
    rhs: SmtTerm,
    op: fn(i64, i64) -> Option<i64>,
    rebuild: fn(SmtTerm, SmtTerm) -> SmtTerm,
) -> SmtTerm {
    if let (SmtTerm::IntLit(a), SmtTerm::IntLit(b)) = (&lhs, &rhs) {
        if let Some(n) = op(*a, *b) {
            return SmtTerm::IntLit(n);
        }
    }
    rebuild(lhs, rhs)
}

fn compare(
    lhs: SmtTerm,
    rhs: SmtTerm,
    op: fn(&i64, &i64) -> bool,
    rebuild: fn(SmtTerm, SmtTerm) -> SmtTerm,
) -> SmtTerm {
    match (&lhs, &rhs) {
        (SmtTerm::IntLit(a), SmtTerm::IntLit(b)) => SmtTerm::BoolLit(op(a, b)),
        _ => rebuild(lhs, rhs),
    }
}
