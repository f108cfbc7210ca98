//! Expression encoder: program-logic expressions to [`SmtTerm`]s.
//!
//! Encoding is a single exhaustive match over [`Expression`]. Operand sorts
//! are re-checked at every node; the VC generator already type-checked its
//! output, so any mismatch here is a defect upstream and aborts encoding.

use std::fmt;

use miette::Diagnostic;
use num::bigint::BigInt;
use num::rational::BigRational;
use pivc_ir::expression::{BinaryOp, Expression, Quantifier};
use pivc_ir::types::Type;
use thiserror::Error;

use crate::backends::smtlib_printer::is_expressible_symbol;
use crate::predicates::PredicateRegistry;
use crate::sorts::{sort_of_type, SmtSort};
use crate::terms::SmtTerm;

/// Sort class an operand was required to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedSort {
    Bool,
    Int,
    Arithmetic,
    Array,
    Exactly(SmtSort),
}

impl fmt::Display for ExpectedSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedSort::Bool => write!(f, "Bool"),
            ExpectedSort::Int => write!(f, "Int"),
            ExpectedSort::Arithmetic => write!(f, "an arithmetic sort (Int or Real)"),
            ExpectedSort::Array => write!(f, "an array sort"),
            ExpectedSort::Exactly(sort) => write!(f, "{sort}"),
        }
    }
}

/// Fatal encoding defects.
///
/// None of these is a property of the goal being checked; each one means the
/// caller handed over an ill-formed expression or predicate.
#[derive(Debug, Error, Diagnostic)]
pub enum EncodeError {
    #[error("sort mismatch at `{node}`: expected {expected}, found {found}")]
    #[diagnostic(code(pivc::encode::sort_mismatch))]
    SortMismatch {
        node: String,
        expected: ExpectedSort,
        found: SmtSort,
    },

    #[error("length of `{node}` does not name an array variable or an array update")]
    #[diagnostic(code(pivc::encode::malformed_length))]
    MalformedLength { node: String },

    #[error("predicate '{0}' is called before it was registered")]
    #[diagnostic(
        code(pivc::encode::unregistered_predicate),
        help("register every predicate before encoding expressions that call it")
    )]
    UnregisteredPredicate(String),

    #[error("predicate '{0}' is already registered")]
    #[diagnostic(code(pivc::encode::duplicate_predicate))]
    DuplicatePredicate(String),

    #[error("unsupported parameter type {ty} for parameter '{parameter}' of predicate '{predicate}'")]
    #[diagnostic(
        code(pivc::encode::unsupported_parameter),
        help("predicate parameters must be int, float or bool")
    )]
    UnsupportedParameterType {
        predicate: String,
        parameter: String,
        ty: String,
    },

    #[error("predicate '{predicate}' takes {expected} argument(s), {found} given")]
    #[diagnostic(code(pivc::encode::arity_mismatch))]
    ArityMismatch {
        predicate: String,
        expected: usize,
        found: usize,
    },

    #[error("quantified variable '{name}' is used at sort {found}; only Int is supported")]
    #[diagnostic(code(pivc::encode::bound_variable_sort))]
    BoundVariableSort { name: String, found: SmtSort },

    #[error("float constant {0} is not a finite real")]
    #[diagnostic(code(pivc::encode::non_finite_float))]
    NonFiniteFloat(f64),

    #[error("name '{0}' contains '|' or '\\' and cannot be written as an SMT-LIB symbol")]
    #[diagnostic(code(pivc::encode::invalid_name))]
    InvalidName(String),

    #[error("constant '{name}' is used at both {first} and {second}")]
    #[diagnostic(
        code(pivc::encode::conflicting_sorts),
        help("constant names are global to a verification session")
    )]
    ConflictingSorts {
        name: String,
        first: SmtSort,
        second: SmtSort,
    },
}

/// Encode an expression against the current predicate registry.
pub fn encode(expr: &Expression, registry: &PredicateRegistry) -> Result<SmtTerm, EncodeError> {
    encode_sorted(expr, registry).map(|(term, _)| term)
}

/// Encode an expression that must be a formula (Bool-sorted).
pub fn encode_formula(
    expr: &Expression,
    registry: &PredicateRegistry,
) -> Result<SmtTerm, EncodeError> {
    let (term, sort) = encode_sorted(expr, registry)?;
    expect_sort(expr, &sort, ExpectedSort::Bool)?;
    Ok(term)
}

/// Encode an expression and report the sort of the resulting term.
pub fn encode_sorted(
    expr: &Expression,
    registry: &PredicateRegistry,
) -> Result<(SmtTerm, SmtSort), EncodeError> {
    let mut encoder = Encoder {
        registry,
        bound: Vec::new(),
    };
    let encoded = encoder.encode(expr)?;
    Ok((encoded.term, encoded.sort))
}

/// Declarations needed to state `term`: its free constants, one per name.
pub fn declarations(term: &SmtTerm) -> Result<Vec<(String, SmtSort)>, EncodeError> {
    let mut out: Vec<(String, SmtSort)> = Vec::new();
    for (name, sort) in term.free_vars() {
        if let Some((_, first)) = out.iter().find(|(n, _)| *n == name) {
            return Err(EncodeError::ConflictingSorts {
                name,
                first: first.clone(),
                second: sort,
            });
        }
        out.push((name, sort));
    }
    Ok(out)
}

struct Encoded {
    term: SmtTerm,
    sort: SmtSort,
}

impl Encoded {
    fn new(term: SmtTerm, sort: SmtSort) -> Self {
        Self { term, sort }
    }
}

struct Encoder<'a> {
    registry: &'a PredicateRegistry,
    /// Names bound by enclosing quantifiers, innermost last.
    bound: Vec<String>,
}

impl Encoder<'_> {
    fn encode(&mut self, expr: &Expression) -> Result<Encoded, EncodeError> {
        match expr {
            Expression::Var(v) => {
                checked_name(&v.name)?;
                let sort = sort_of_type(&v.ty);
                if self.bound.iter().any(|b| *b == v.name) && sort != SmtSort::Int {
                    return Err(EncodeError::BoundVariableSort {
                        name: v.name.clone(),
                        found: sort,
                    });
                }
                Ok(Encoded::new(SmtTerm::var(v.name.clone(), sort.clone()), sort))
            }
            Expression::IntConst(n) => Ok(Encoded::new(SmtTerm::IntLit(*n), SmtSort::Int)),
            Expression::FloatConst(x) => {
                let value = real_literal(*x).ok_or(EncodeError::NonFiniteFloat(*x))?;
                Ok(Encoded::new(SmtTerm::RealLit(value), SmtSort::Real))
            }
            Expression::BoolConst(b) => Ok(Encoded::new(SmtTerm::BoolLit(*b), SmtSort::Bool)),
            Expression::PredicateCall { predicate, args } => self.encode_call(predicate, args),
            Expression::Subscript { array, index } => {
                let a = self.encode(array)?;
                let element = expect_array(array, &a.sort)?;
                let i = self.encode(index)?;
                expect_sort(index, &i.sort, ExpectedSort::Int)?;
                Ok(Encoded::new(a.term.select(i.term), element))
            }
            Expression::ArrayUpdate {
                array,
                index,
                value,
                ..
            } => {
                let a = self.encode(array)?;
                let element = expect_array(array, &a.sort)?;
                let i = self.encode(index)?;
                expect_sort(index, &i.sort, ExpectedSort::Int)?;
                let v = self.encode(value)?;
                let v_term = coerce_to(value, v, &element)?;
                Ok(Encoded::new(a.term.store(i.term, v_term), a.sort))
            }
            Expression::Not(inner) => {
                let e = self.encode(inner)?;
                expect_sort(inner, &e.sort, ExpectedSort::Bool)?;
                Ok(Encoded::new(e.term.not(), SmtSort::Bool))
            }
            Expression::Neg(inner) => {
                let e = self.encode(inner)?;
                expect_sort(inner, &e.sort, ExpectedSort::Arithmetic)?;
                Ok(Encoded::new(e.term.neg(), e.sort))
            }
            Expression::Binary { op, lhs, rhs } => self.encode_binary(*op, lhs, rhs),
            Expression::Quantified {
                quantifier,
                bound,
                body,
            } => {
                for name in bound {
                    checked_name(name)?;
                }
                let depth = self.bound.len();
                self.bound.extend(bound.iter().cloned());
                let encoded = self.encode(body);
                self.bound.truncate(depth);
                let b = encoded?;
                expect_sort(body, &b.sort, ExpectedSort::Bool)?;
                if bound.is_empty() {
                    return Ok(b);
                }
                let bindings = bound.iter().map(|n| (n.clone(), SmtSort::Int)).collect();
                let term = match quantifier {
                    Quantifier::Forall => SmtTerm::ForAll(bindings, Box::new(b.term)),
                    Quantifier::Exists => SmtTerm::Exists(bindings, Box::new(b.term)),
                };
                Ok(Encoded::new(term, SmtSort::Bool))
            }
            Expression::Length(inner) => encode_length(inner),
        }
    }

    fn encode_call(&mut self, predicate: &str, args: &[Expression]) -> Result<Encoded, EncodeError> {
        let registry = self.registry;
        let definition = registry
            .get(predicate)
            .ok_or_else(|| EncodeError::UnregisteredPredicate(predicate.to_string()))?;
        if definition.formals.len() != args.len() {
            return Err(EncodeError::ArityMismatch {
                predicate: predicate.to_string(),
                expected: definition.formals.len(),
                found: args.len(),
            });
        }

        let mut actuals = Vec::with_capacity(args.len());
        for (arg, (_, sort)) in args.iter().zip(&definition.formals) {
            let a = self.encode(arg)?;
            expect_sort(arg, &a.sort, ExpectedSort::Exactly(sort.clone()))?;
            actuals.push(a.term);
        }
        Ok(Encoded::new(definition.instantiate(actuals), SmtSort::Bool))
    }

    fn encode_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expression,
        rhs: &Expression,
    ) -> Result<Encoded, EncodeError> {
        let l = self.encode(lhs)?;
        let r = self.encode(rhs)?;
        let boxed = |l: SmtTerm, r: SmtTerm| (Box::new(l), Box::new(r));

        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                let (l, r, sort) = arithmetic_pair(lhs, l, rhs, r)?;
                let term = match op {
                    BinaryOp::Add => l.add(r),
                    BinaryOp::Sub => l.sub(r),
                    _ => l.mul(r),
                };
                Ok(Encoded::new(term, sort))
            }
            BinaryOp::Div | BinaryOp::FloatDiv => {
                let (l, r, sort) = arithmetic_pair(lhs, l, rhs, r)?;
                let (l, r) = boxed(l, r);
                let term = match sort {
                    SmtSort::Int => SmtTerm::IntDiv(l, r),
                    _ => SmtTerm::RealDiv(l, r),
                };
                Ok(Encoded::new(term, sort))
            }
            BinaryOp::Mod => {
                expect_sort(lhs, &l.sort, ExpectedSort::Int)?;
                expect_sort(rhs, &r.sort, ExpectedSort::Int)?;
                let (l, r) = boxed(l.term, r.term);
                Ok(Encoded::new(SmtTerm::Mod(l, r), SmtSort::Int))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let (l, r, _) = arithmetic_pair(lhs, l, rhs, r)?;
                let term = match op {
                    BinaryOp::Lt => l.lt(r),
                    BinaryOp::Le => l.le(r),
                    BinaryOp::Gt => l.gt(r),
                    _ => l.ge(r),
                };
                Ok(Encoded::new(term, SmtSort::Bool))
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let eq = if l.sort.is_arithmetic() && r.sort.is_arithmetic() {
                    let (l, r, _) = arithmetic_pair(lhs, l, rhs, r)?;
                    l.eq(r)
                } else {
                    expect_sort(rhs, &r.sort, ExpectedSort::Exactly(l.sort.clone()))?;
                    l.term.eq(r.term)
                };
                let term = if op == BinaryOp::Ne { eq.not() } else { eq };
                Ok(Encoded::new(term, SmtSort::Bool))
            }
            BinaryOp::And | BinaryOp::Or | BinaryOp::Implies | BinaryOp::Iff => {
                expect_sort(lhs, &l.sort, ExpectedSort::Bool)?;
                expect_sort(rhs, &r.sort, ExpectedSort::Bool)?;
                let term = match op {
                    BinaryOp::And => SmtTerm::and(vec![l.term, r.term]),
                    BinaryOp::Or => SmtTerm::or(vec![l.term, r.term]),
                    BinaryOp::Implies => l.term.implies(r.term),
                    _ => l.term.iff(r.term),
                };
                Ok(Encoded::new(term, SmtSort::Bool))
            }
        }
    }
}

fn encode_length(target: &Expression) -> Result<Encoded, EncodeError> {
    match target {
        Expression::Var(v) => match &v.ty {
            Type::Array(at) => {
                checked_name(&at.length)?;
                Ok(Encoded::new(SmtTerm::int_var(at.length.clone()), SmtSort::Int))
            }
            _ => Err(EncodeError::MalformedLength {
                node: target.to_string(),
            }),
        },
        Expression::ArrayUpdate { length, .. } => {
            let sort = sort_of_type(&length.ty);
            if sort != SmtSort::Int {
                return Err(EncodeError::SortMismatch {
                    node: length.name.clone(),
                    expected: ExpectedSort::Int,
                    found: sort,
                });
            }
            checked_name(&length.name)?;
            Ok(Encoded::new(SmtTerm::int_var(length.name.clone()), SmtSort::Int))
        }
        _ => Err(EncodeError::MalformedLength {
            node: target.to_string(),
        }),
    }
}

fn checked_name(name: &str) -> Result<(), EncodeError> {
    if is_expressible_symbol(name) {
        Ok(())
    } else {
        Err(EncodeError::InvalidName(name.to_string()))
    }
}

fn expect_sort(node: &Expression, found: &SmtSort, expected: ExpectedSort) -> Result<(), EncodeError> {
    let ok = match &expected {
        ExpectedSort::Bool => *found == SmtSort::Bool,
        ExpectedSort::Int => *found == SmtSort::Int,
        ExpectedSort::Arithmetic => found.is_arithmetic(),
        ExpectedSort::Array => found.element().is_some(),
        ExpectedSort::Exactly(sort) => found == sort,
    };
    if ok {
        Ok(())
    } else {
        Err(EncodeError::SortMismatch {
            node: node.to_string(),
            expected,
            found: found.clone(),
        })
    }
}

fn expect_array(node: &Expression, found: &SmtSort) -> Result<SmtSort, EncodeError> {
    expect_sort(node, found, ExpectedSort::Array)?;
    Ok(found.element().cloned().unwrap_or(SmtSort::Int))
}

/// Check both operands are arithmetic and bring them to a common sort,
/// lifting an `Int` side to `Real` when the other side is `Real`.
fn arithmetic_pair(
    lhs: &Expression,
    l: Encoded,
    rhs: &Expression,
    r: Encoded,
) -> Result<(SmtTerm, SmtTerm, SmtSort), EncodeError> {
    expect_sort(lhs, &l.sort, ExpectedSort::Arithmetic)?;
    expect_sort(rhs, &r.sort, ExpectedSort::Arithmetic)?;
    if l.sort == r.sort {
        return Ok((l.term, r.term, l.sort));
    }
    Ok((to_real(l), to_real(r), SmtSort::Real))
}

fn to_real(e: Encoded) -> SmtTerm {
    match e.sort {
        SmtSort::Int => SmtTerm::ToReal(Box::new(e.term)),
        _ => e.term,
    }
}

fn coerce_to(node: &Expression, e: Encoded, target: &SmtSort) -> Result<SmtTerm, EncodeError> {
    if *target == SmtSort::Real && e.sort == SmtSort::Int {
        return Ok(to_real(e));
    }
    expect_sort(node, &e.sort, ExpectedSort::Exactly(target.clone()))?;
    Ok(e.term)
}

/// The exact rational denoted by the shortest decimal rendering of `x`
/// (`0.1` is one tenth, not its binary approximation). `None` for NaN and
/// infinities.
fn real_literal(x: f64) -> Option<BigRational> {
    if !x.is_finite() {
        return None;
    }
    // `Display` for f64 never uses exponent notation.
    let text = x.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let numer: BigInt = format!("{int_part}{frac_part}").parse().ok()?;
    let scale = u32::try_from(frac_part.len()).ok()?;
    Some(BigRational::new(numer, BigInt::from(10u32).pow(scale)))
}
