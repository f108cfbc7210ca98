use std::collections::HashSet;

use num::rational::BigRational;

use crate::sorts::SmtSort;

/// Abstract SMT term representation, solver-agnostic.
///
/// Constants carry their sort, so a term is self-describing: the free
/// constants of a query (and hence its declarations) can be read off the
/// term itself.
#[derive(Debug, Clone, PartialEq)]
pub enum SmtTerm {
    /// Named constant (free) or bound variable.
    Var(String, SmtSort),
    /// Integer literal.
    IntLit(i64),
    /// Exact real literal.
    RealLit(BigRational),
    /// Boolean literal.
    BoolLit(bool),

    // Arithmetic
    Add(Box<SmtTerm>, Box<SmtTerm>),
    Sub(Box<SmtTerm>, Box<SmtTerm>),
    Mul(Box<SmtTerm>, Box<SmtTerm>),
    IntDiv(Box<SmtTerm>, Box<SmtTerm>),
    RealDiv(Box<SmtTerm>, Box<SmtTerm>),
    Mod(Box<SmtTerm>, Box<SmtTerm>),
    Neg(Box<SmtTerm>),
    ToReal(Box<SmtTerm>),

    // Comparison
    Eq(Box<SmtTerm>, Box<SmtTerm>),
    Lt(Box<SmtTerm>, Box<SmtTerm>),
    Le(Box<SmtTerm>, Box<SmtTerm>),
    Gt(Box<SmtTerm>, Box<SmtTerm>),
    Ge(Box<SmtTerm>, Box<SmtTerm>),

    // Boolean logic
    And(Vec<SmtTerm>),
    Or(Vec<SmtTerm>),
    Not(Box<SmtTerm>),
    Implies(Box<SmtTerm>, Box<SmtTerm>),
    Iff(Box<SmtTerm>, Box<SmtTerm>),

    // Arrays
    Select(Box<SmtTerm>, Box<SmtTerm>),
    Store(Box<SmtTerm>, Box<SmtTerm>, Box<SmtTerm>),

    // Quantifiers
    ForAll(Vec<(String, SmtSort)>, Box<SmtTerm>),
    Exists(Vec<(String, SmtSort)>, Box<SmtTerm>),
}

#[allow(clippy::should_implement_trait)]
impl SmtTerm {
    pub fn var(name: impl Into<String>, sort: SmtSort) -> Self {
        SmtTerm::Var(name.into(), sort)
    }

    pub fn int_var(name: impl Into<String>) -> Self {
        SmtTerm::Var(name.into(), SmtSort::Int)
    }

    pub fn int(n: i64) -> Self {
        SmtTerm::IntLit(n)
    }

    /// Real literal `num / den`. `den` must be non-zero.
    pub fn real(num: i64, den: i64) -> Self {
        SmtTerm::RealLit(BigRational::new(num.into(), den.into()))
    }

    pub fn bool(b: bool) -> Self {
        SmtTerm::BoolLit(b)
    }

    pub fn add(self, other: SmtTerm) -> Self {
        SmtTerm::Add(Box::new(self), Box::new(other))
    }

    pub fn sub(self, other: SmtTerm) -> Self {
        SmtTerm::Sub(Box::new(self), Box::new(other))
    }

    pub fn mul(self, other: SmtTerm) -> Self {
        SmtTerm::Mul(Box::new(self), Box::new(other))
    }

    pub fn neg(self) -> Self {
        SmtTerm::Neg(Box::new(self))
    }

    pub fn eq(self, other: SmtTerm) -> Self {
        SmtTerm::Eq(Box::new(self), Box::new(other))
    }

    pub fn lt(self, other: SmtTerm) -> Self {
        SmtTerm::Lt(Box::new(self), Box::new(other))
    }

    pub fn le(self, other: SmtTerm) -> Self {
        SmtTerm::Le(Box::new(self), Box::new(other))
    }

    pub fn gt(self, other: SmtTerm) -> Self {
        SmtTerm::Gt(Box::new(self), Box::new(other))
    }

    pub fn ge(self, other: SmtTerm) -> Self {
        SmtTerm::Ge(Box::new(self), Box::new(other))
    }

    pub fn and(terms: Vec<SmtTerm>) -> Self {
        SmtTerm::And(terms)
    }

    pub fn or(terms: Vec<SmtTerm>) -> Self {
        SmtTerm::Or(terms)
    }

    pub fn not(self) -> Self {
        SmtTerm::Not(Box::new(self))
    }

    pub fn implies(self, other: SmtTerm) -> Self {
        SmtTerm::Implies(Box::new(self), Box::new(other))
    }

    pub fn iff(self, other: SmtTerm) -> Self {
        SmtTerm::Iff(Box::new(self), Box::new(other))
    }

    pub fn select(self, index: SmtTerm) -> Self {
        SmtTerm::Select(Box::new(self), Box::new(index))
    }

    pub fn store(self, index: SmtTerm, value: SmtTerm) -> Self {
        SmtTerm::Store(Box::new(self), Box::new(index), Box::new(value))
    }

    /// Free constants in order of first occurrence.
    ///
    /// A name used at two different sorts is reported once per sort, so
    /// callers can detect the clash.
    pub fn free_vars(&self) -> Vec<(String, SmtSort)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut bound = Vec::new();
        collect_free_vars(self, &mut bound, &mut seen, &mut out);
        out
    }

    fn free_var_names(&self) -> HashSet<String> {
        self.free_vars().into_iter().map(|(name, _)| name).collect()
    }

    /// Parallel, capture-avoiding substitution of free constants by name.
    ///
    /// Bound variables shadow substitutions for their names. A binder whose
    /// name occurs free in a replacement is renamed to a fresh `name!k`.
    pub fn substitute(&self, subst: &[(String, SmtTerm)]) -> SmtTerm {
        if subst.is_empty() {
            return self.clone();
        }
        let sub = |t: &SmtTerm| Box::new(t.substitute(subst));
        match self {
            SmtTerm::Var(name, _) => subst
                .iter()
                .find(|(from, _)| from == name)
                .map(|(_, to)| to.clone())
                .unwrap_or_else(|| self.clone()),
            SmtTerm::IntLit(_) | SmtTerm::RealLit(_) | SmtTerm::BoolLit(_) => self.clone(),
            SmtTerm::Add(l, r) => SmtTerm::Add(sub(l), sub(r)),
            SmtTerm::Sub(l, r) => SmtTerm::Sub(sub(l), sub(r)),
            SmtTerm::Mul(l, r) => SmtTerm::Mul(sub(l), sub(r)),
            SmtTerm::IntDiv(l, r) => SmtTerm::IntDiv(sub(l), sub(r)),
            SmtTerm::RealDiv(l, r) => SmtTerm::RealDiv(sub(l), sub(r)),
            SmtTerm::Mod(l, r) => SmtTerm::Mod(sub(l), sub(r)),
            SmtTerm::Neg(inner) => SmtTerm::Neg(sub(inner)),
            SmtTerm::ToReal(inner) => SmtTerm::ToReal(sub(inner)),
            SmtTerm::Eq(l, r) => SmtTerm::Eq(sub(l), sub(r)),
            SmtTerm::Lt(l, r) => SmtTerm::Lt(sub(l), sub(r)),
            SmtTerm::Le(l, r) => SmtTerm::Le(sub(l), sub(r)),
            SmtTerm::Gt(l, r) => SmtTerm::Gt(sub(l), sub(r)),
            SmtTerm::Ge(l, r) => SmtTerm::Ge(sub(l), sub(r)),
            SmtTerm::And(terms) => SmtTerm::And(terms.iter().map(|t| t.substitute(subst)).collect()),
            SmtTerm::Or(terms) => SmtTerm::Or(terms.iter().map(|t| t.substitute(subst)).collect()),
            SmtTerm::Not(inner) => SmtTerm::Not(sub(inner)),
            SmtTerm::Implies(l, r) => SmtTerm::Implies(sub(l), sub(r)),
            SmtTerm::Iff(l, r) => SmtTerm::Iff(sub(l), sub(r)),
            SmtTerm::Select(a, i) => SmtTerm::Select(sub(a), sub(i)),
            SmtTerm::Store(a, i, v) => SmtTerm::Store(sub(a), sub(i), sub(v)),
            SmtTerm::ForAll(bindings, body) => {
                let (bindings, body) = substitute_under_binder(bindings, body, subst);
                SmtTerm::ForAll(bindings, Box::new(body))
            }
            SmtTerm::Exists(bindings, body) => {
                let (bindings, body) = substitute_under_binder(bindings, body, subst);
                SmtTerm::Exists(bindings, Box::new(body))
            }
        }
    }
}

fn substitute_under_binder(
    bindings: &[(String, SmtSort)],
    body: &SmtTerm,
    subst: &[(String, SmtTerm)],
) -> (Vec<(String, SmtSort)>, SmtTerm) {
    let remaining: Vec<(String, SmtTerm)> = subst
        .iter()
        .filter(|(from, _)| !bindings.iter().any(|(b, _)| b == from))
        .cloned()
        .collect();
    if remaining.is_empty() {
        return (bindings.to_vec(), body.clone());
    }

    let mut taken: HashSet<String> = remaining
        .iter()
        .flat_map(|(_, to)| to.free_var_names())
        .collect();
    let clashing: Vec<&(String, SmtSort)> =
        bindings.iter().filter(|(b, _)| taken.contains(b)).collect();
    if clashing.is_empty() {
        return (bindings.to_vec(), body.substitute(&remaining));
    }

    taken.extend(body.free_var_names());
    taken.extend(bindings.iter().map(|(b, _)| b.clone()));
    let mut renaming = Vec::new();
    let mut new_bindings = Vec::with_capacity(bindings.len());
    for (name, sort) in bindings {
        if clashing.iter().any(|(c, _)| c == name) {
            let fresh = fresh_name(name, &taken);
            taken.insert(fresh.clone());
            renaming.push((name.clone(), SmtTerm::Var(fresh.clone(), sort.clone())));
            new_bindings.push((fresh, sort.clone()));
        } else {
            new_bindings.push((name.clone(), sort.clone()));
        }
    }
    let renamed = body.substitute(&renaming);
    (new_bindings, renamed.substitute(&remaining))
}

fn fresh_name(base: &str, taken: &HashSet<String>) -> String {
    (0..)
        .map(|k| format!("{base}!{k}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{base}!"))
}

fn collect_free_vars(
    term: &SmtTerm,
    bound: &mut Vec<String>,
    seen: &mut HashSet<(String, SmtSort)>,
    out: &mut Vec<(String, SmtSort)>,
) {
    match term {
        SmtTerm::Var(name, sort) => {
            if !bound.iter().any(|b| b == name) {
                let key = (name.clone(), sort.clone());
                if seen.insert(key.clone()) {
                    out.push(key);
                }
            }
        }
        SmtTerm::IntLit(_) | SmtTerm::RealLit(_) | SmtTerm::BoolLit(_) => {}
        SmtTerm::Neg(inner) | SmtTerm::ToReal(inner) | SmtTerm::Not(inner) => {
            collect_free_vars(inner, bound, seen, out)
        }
        SmtTerm::Add(l, r)
        | SmtTerm::Sub(l, r)
        | SmtTerm::Mul(l, r)
        | SmtTerm::IntDiv(l, r)
        | SmtTerm::RealDiv(l, r)
        | SmtTerm::Mod(l, r)
        | SmtTerm::Eq(l, r)
        | SmtTerm::Lt(l, r)
        | SmtTerm::Le(l, r)
        | SmtTerm::Gt(l, r)
        | SmtTerm::Ge(l, r)
        | SmtTerm::Implies(l, r)
        | SmtTerm::Iff(l, r)
        | SmtTerm::Select(l, r) => {
            collect_free_vars(l, bound, seen, out);
            collect_free_vars(r, bound, seen, out);
        }
        SmtTerm::Store(a, i, v) => {
            collect_free_vars(a, bound, seen, out);
            collect_free_vars(i, bound, seen, out);
            collect_free_vars(v, bound, seen, out);
        }
        SmtTerm::And(terms) | SmtTerm::Or(terms) => {
            for t in terms {
                collect_free_vars(t, bound, seen, out);
            }
        }
        SmtTerm::ForAll(bindings, body) | SmtTerm::Exists(bindings, body) => {
            let depth = bound.len();
            bound.extend(bindings.iter().map(|(name, _)| name.clone()));
            collect_free_vars(body, bound, seen, out);
            bound.truncate(depth);
        }
    }
}
