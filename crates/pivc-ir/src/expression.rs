use std::fmt;

use crate::types::Variable;

/// Binary operators of the program logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    FloatDiv,
    Mod,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Implies,
    Iff,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloatDiv => "/.",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Implies => "==>",
            BinaryOp::Iff => "<==>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Forall,
    Exists,
}

/// Logical expression built by the verification-condition generator.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Var(Variable),
    IntConst(i64),
    FloatConst(f64),
    BoolConst(bool),
    /// Call of a registered predicate, identified by name.
    PredicateCall {
        predicate: String,
        args: Vec<Expression>,
    },
    Subscript {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    /// Functional array update. `length` is the length variable the updated
    /// array keeps; an update never changes the length.
    ArrayUpdate {
        array: Box<Expression>,
        index: Box<Expression>,
        value: Box<Expression>,
        length: Variable,
    },
    Not(Box<Expression>),
    Neg(Box<Expression>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// Quantification over integer-valued names.
    Quantified {
        quantifier: Quantifier,
        bound: Vec<String>,
        body: Box<Expression>,
    },
    Length(Box<Expression>),
}

#[allow(clippy::should_implement_trait)]
impl Expression {
    pub fn var(variable: Variable) -> Self {
        Expression::Var(variable)
    }

    pub fn int(n: i64) -> Self {
        Expression::IntConst(n)
    }

    pub fn float(x: f64) -> Self {
        Expression::FloatConst(x)
    }

    pub fn bool(b: bool) -> Self {
        Expression::BoolConst(b)
    }

    pub fn call(predicate: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::PredicateCall {
            predicate: predicate.into(),
            args,
        }
    }

    pub fn subscript(self, index: Expression) -> Self {
        Expression::Subscript {
            array: Box::new(self),
            index: Box::new(index),
        }
    }

    pub fn update(self, index: Expression, value: Expression, length: Variable) -> Self {
        Expression::ArrayUpdate {
            array: Box::new(self),
            index: Box::new(index),
            value: Box::new(value),
            length,
        }
    }

    pub fn length(self) -> Self {
        Expression::Length(Box::new(self))
    }

    pub fn not(self) -> Self {
        Expression::Not(Box::new(self))
    }

    pub fn neg(self) -> Self {
        Expression::Neg(Box::new(self))
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Add, self, other)
    }

    pub fn sub(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Sub, self, other)
    }

    pub fn mul(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Mul, self, other)
    }

    pub fn div(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Div, self, other)
    }

    pub fn float_div(self, other: Expression) -> Self {
        Self::binary(BinaryOp::FloatDiv, self, other)
    }

    pub fn modulo(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Mod, self, other)
    }

    pub fn lt(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Lt, self, other)
    }

    pub fn le(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Le, self, other)
    }

    pub fn gt(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Gt, self, other)
    }

    pub fn ge(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Ge, self, other)
    }

    pub fn eq(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    pub fn ne(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Ne, self, other)
    }

    pub fn and(self, other: Expression) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Or, self, other)
    }

    pub fn implies(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Implies, self, other)
    }

    pub fn iff(self, other: Expression) -> Self {
        Self::binary(BinaryOp::Iff, self, other)
    }

    pub fn forall(bound: Vec<String>, body: Expression) -> Self {
        Expression::Quantified {
            quantifier: Quantifier::Forall,
            bound,
            body: Box::new(body),
        }
    }

    pub fn exists(bound: Vec<String>, body: Expression) -> Self {
        Expression::Quantified {
            quantifier: Quantifier::Exists,
            bound,
            body: Box::new(body),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Var(v) => write!(f, "{}", v.name),
            Expression::IntConst(n) => write!(f, "{n}"),
            Expression::FloatConst(x) => write!(f, "{x:?}"),
            Expression::BoolConst(b) => write!(f, "{b}"),
            Expression::PredicateCall { predicate, args } => {
                write!(f, "{predicate}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expression::Subscript { array, index } => write!(f, "{array}[{index}]"),
            Expression::ArrayUpdate {
                array,
                index,
                value,
                ..
            } => write!(f, "{array}{{{index} <- {value}}}"),
            Expression::Not(inner) => write!(f, "!{inner}"),
            Expression::Neg(inner) => write!(f, "-{inner}"),
            Expression::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expression::Quantified {
                quantifier,
                bound,
                body,
            } => {
                let q = match quantifier {
                    Quantifier::Forall => "forall",
                    Quantifier::Exists => "exists",
                };
                write!(f, "({q} {}. {body})", bound.join(" "))
            }
            Expression::Length(inner) => write!(f, "|{inner}|"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AtomicType, Variable};

    #[test]
    fn display_binary_and_quantifier() {
        let x = Expression::var(Variable::int("x"));
        let e = Expression::forall(
            vec!["x".into()],
            x.clone().ge(Expression::int(0)).or(x.lt(Expression::int(0))),
        );
        assert_eq!(e.to_string(), "(forall x. ((x >= 0) || (x < 0)))");
    }

    #[test]
    fn display_array_forms() {
        let arr = Variable::array("a", AtomicType::Int);
        let len = arr.length_variable().expect("array has a length variable");
        let a = Expression::var(arr);
        let upd = a.clone().update(Expression::int(1), Expression::int(7), len);
        assert_eq!(upd.to_string(), "a{1 <- 7}");
        assert_eq!(upd.clone().length().to_string(), "|a{1 <- 7}|");
        assert_eq!(a.subscript(Expression::int(0)).to_string(), "a[0]");
    }

    #[test]
    fn display_predicate_call_and_unary() {
        let call = Expression::call("P", vec![Expression::int(5), Expression::bool(true)]);
        assert_eq!(call.to_string(), "P(5, true)");
        assert_eq!(Expression::int(3).neg().to_string(), "-3");
        assert_eq!(Expression::bool(false).not().to_string(), "!false");
        assert_eq!(Expression::float(1.5).to_string(), "1.5");
    }
}
