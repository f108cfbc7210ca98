use crate::expression::Expression;
use crate::types::Variable;

/// A user-defined predicate: a named, parameterised formula.
///
/// Predicates are identified by name. Bodies may call predicates defined
/// earlier, never themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub name: String,
    pub parameters: Vec<Variable>,
    pub body: Expression,
}

impl Predicate {
    pub fn new(name: impl Into<String>, parameters: Vec<Variable>, body: Expression) -> Self {
        Self {
            name: name.into(),
            parameters,
            body,
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Build a call of this predicate.
    pub fn call(&self, args: Vec<Expression>) -> Expression {
        Expression::call(self.name.clone(), args)
    }
}
