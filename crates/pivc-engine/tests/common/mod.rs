#![allow(dead_code)]

use pivc_engine::{CounterModel, Verifier, VerifierOptions};
use pivc_ir::{AtomicType, Expression, Variable};

pub fn verifier() -> Verifier {
    Verifier::with_defaults().expect("z3 backend should always be available")
}

pub fn verifier_with(options: VerifierOptions) -> Verifier {
    Verifier::new(options).expect("verifier construction should succeed")
}

pub fn int(name: &str) -> Expression {
    Expression::var(Variable::int(name))
}

pub fn float(name: &str) -> Expression {
    Expression::var(Variable::float(name))
}

pub fn boolean(name: &str) -> Expression {
    Expression::var(Variable::bool(name))
}

/// An array variable together with its companion length variable.
pub fn array(name: &str, element: AtomicType) -> (Expression, Variable) {
    let var = Variable::array(name, element);
    let len = var
        .length_variable()
        .expect("array variables carry a length variable");
    (Expression::var(var), len)
}

pub fn assert_valid(verifier: &mut Verifier, goal: &Expression) {
    let outcome = verifier
        .check_valid(goal)
        .unwrap_or_else(|e| panic!("checking {goal} failed: {e}"));
    assert!(outcome.is_none(), "expected {goal} to be valid, got {outcome:?}");
}

pub fn assert_refuted(verifier: &mut Verifier, goal: &Expression) -> CounterModel {
    let cm = verifier
        .check_valid(goal)
        .unwrap_or_else(|e| panic!("checking {goal} failed: {e}"))
        .unwrap_or_else(|| panic!("expected {goal} to be refuted"));
    assert!(
        !cm.is_inconclusive(),
        "expected a refutation of {goal}, solver gave up: {:?}",
        cm.inconclusive_reason()
    );
    cm
}
