//! Registry of user-defined predicates.
//!
//! A predicate is encoded once, at registration: its formals become typed
//! constants and its body an [`SmtTerm`] over them. A call site is then the
//! body with actual arguments substituted for the formals (see
//! [`crate::encoder`]), so no uninterpreted functions reach the solver.

use indexmap::IndexMap;
use pivc_ir::predicate::Predicate;
use pivc_ir::types::Type;
use tracing::debug;

use crate::encoder::{encode_formula, EncodeError};
use crate::sorts::{sort_of_type, SmtSort};
use crate::terms::SmtTerm;

/// Encoded form of a registered predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateDefinition {
    pub name: String,
    /// Formal parameters in declaration order.
    pub formals: Vec<(String, SmtSort)>,
    pub body: SmtTerm,
}

impl PredicateDefinition {
    pub fn arity(&self) -> usize {
        self.formals.len()
    }

    /// Instantiate the body with already-encoded arguments.
    ///
    /// Callers are responsible for arity and argument sorts; the encoder
    /// checks both before getting here.
    pub fn instantiate(&self, args: Vec<SmtTerm>) -> SmtTerm {
        let subst: Vec<(String, SmtTerm)> = self
            .formals
            .iter()
            .map(|(name, _)| name.clone())
            .zip(args)
            .collect();
        self.body.substitute(&subst)
    }
}

/// Predicates known to a verification session, keyed by name, in
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct PredicateRegistry {
    definitions: IndexMap<String, PredicateDefinition>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and record a predicate.
    ///
    /// The body may call only predicates registered before this one.
    pub fn register(&mut self, predicate: &Predicate) -> Result<(), EncodeError> {
        if self.definitions.contains_key(&predicate.name) {
            return Err(EncodeError::DuplicatePredicate(predicate.name.clone()));
        }

        let mut formals = Vec::with_capacity(predicate.parameters.len());
        for param in &predicate.parameters {
            if let Type::Array(_) = param.ty {
                return Err(EncodeError::UnsupportedParameterType {
                    predicate: predicate.name.clone(),
                    parameter: param.name.clone(),
                    ty: param.ty.to_string(),
                });
            }
            formals.push((param.name.clone(), sort_of_type(&param.ty)));
        }

        let body = encode_formula(&predicate.body, self)?;
        debug!(
            predicate = %predicate.name,
            arity = formals.len(),
            "registered predicate"
        );
        self.definitions.insert(
            predicate.name.clone(),
            PredicateDefinition {
                name: predicate.name.clone(),
                formals,
                body,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PredicateDefinition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivc_ir::expression::Expression;
    use pivc_ir::types::{AtomicType, Variable};

    fn positive() -> Predicate {
        let a = Variable::int("a");
        Predicate::new("positive", vec![a.clone()], Expression::var(a).gt(Expression::int(0)))
    }

    #[test]
    fn register_encodes_formals_and_body() {
        let mut reg = PredicateRegistry::new();
        reg.register(&positive()).unwrap();
        let def = reg.get("positive").unwrap();
        assert_eq!(def.formals, vec![("a".to_string(), SmtSort::Int)]);
        assert_eq!(def.body, SmtTerm::int_var("a").gt(SmtTerm::int(0)));
        assert_eq!(def.instantiate(vec![SmtTerm::int(5)]), SmtTerm::int(5).gt(SmtTerm::int(0)));
        assert!(reg.contains("positive"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut reg = PredicateRegistry::new();
        reg.register(&positive()).unwrap();
        let err = reg.register(&positive()).unwrap_err();
        assert!(matches!(err, EncodeError::DuplicatePredicate(ref n) if n == "positive"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn array_parameters_are_rejected() {
        let arr = Variable::array("xs", AtomicType::Int);
        let pred = Predicate::new(
            "sorted",
            vec![arr.clone()],
            Expression::var(arr).length().ge(Expression::int(0)),
        );
        let mut reg = PredicateRegistry::new();
        assert!(matches!(
            reg.register(&pred),
            Err(EncodeError::UnsupportedParameterType { ref parameter, .. }) if parameter == "xs"
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn bodies_may_call_earlier_predicates() {
        let mut reg = PredicateRegistry::new();
        reg.register(&positive()).unwrap();
        let b = Variable::int("b");
        let both = Predicate::new(
            "both_positive",
            vec![b.clone()],
            Expression::call("positive", vec![Expression::var(b.clone())])
                .and(Expression::call("positive", vec![Expression::var(b).add(Expression::int(1))])),
        );
        reg.register(&both).unwrap();
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["positive", "both_positive"]);
    }

    #[test]
    fn self_reference_is_unregistered() {
        let n = Variable::int("n");
        let rec = Predicate::new("loop", vec![n.clone()], Expression::call("loop", vec![Expression::var(n)]));
        let mut reg = PredicateRegistry::new();
        assert!(matches!(
            reg.register(&rec),
            Err(EncodeError::UnregisteredPredicate(_))
        ));
    }

    #[test]
    fn non_boolean_body_is_a_sort_mismatch() {
        let n = Variable::int("n");
        let pred = Predicate::new("bad", vec![n.clone()], Expression::var(n));
        let mut reg = PredicateRegistry::new();
        assert!(matches!(reg.register(&pred), Err(EncodeError::SortMismatch { .. })));
    }
}
