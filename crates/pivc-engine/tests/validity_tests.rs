mod common;

use common::*;
use pivc_engine::{VerifierOptions, VerifyError};
use pivc_ir::{AtomicType, Expression};
use pivc_smt::encoder::EncodeError;

#[test]
fn tautology_is_valid() {
    let mut v = verifier();
    let goal = int("x").gt(Expression::int(0)).or(int("x").le(Expression::int(0)));
    assert_valid(&mut v, &goal);
}

#[test]
fn non_tautology_reports_a_falsifying_assignment() {
    let mut v = verifier();
    let cm = assert_refuted(&mut v, &int("x").gt(Expression::int(0)));
    let x = cm.get_int("x").expect("counter-model should assign x");
    assert!(x <= 0, "x = {x} does not falsify x > 0");
}

#[test]
fn boolean_counter_model() {
    let mut v = verifier();
    let cm = assert_refuted(&mut v, &boolean("b").not());
    assert_eq!(cm.get_bool("b"), Some(true));
}

#[test]
fn repeated_checks_agree() {
    let mut v = verifier();
    let goal = int("x").add(int("y")).gt(int("x"));
    let first = v.check_valid(&goal).unwrap();
    let second = v.check_valid(&goal).unwrap();
    assert!(first.is_some());
    assert_eq!(first.is_some(), second.is_some());

    let valid = int("x").add(Expression::int(1)).gt(int("x"));
    assert!(v.check_valid(&valid).unwrap().is_none());
    assert!(v.check_valid(&valid).unwrap().is_none());
}

#[test]
fn checks_do_not_leak_into_each_other() {
    let mut v = verifier();
    // x is an Int in the first goal and a Bool in the second.
    assert_refuted(&mut v, &int("x").gt(Expression::int(0)));
    let cm = assert_refuted(&mut v, &boolean("x"));
    assert_eq!(cm.get_bool("x"), Some(false));
}

#[test]
fn read_over_write_holds_for_every_element_sort() {
    let mut v = verifier();
    let i = int("i");
    for (element, value) in [
        (AtomicType::Int, int("v")),
        (AtomicType::Float, float("w")),
        (AtomicType::Bool, boolean("flag")),
    ] {
        let (a, len) = array("a", element);
        let goal = a
            .update(i.clone(), value.clone(), len)
            .subscript(i.clone())
            .eq(value);
        assert_valid(&mut v, &goal);
    }
}

#[test]
fn write_elsewhere_leaves_element_unchanged() {
    let mut v = verifier();
    let (a, len) = array("a", AtomicType::Int);
    let goal = int("i").ne(int("j")).implies(
        a.clone()
            .update(int("i"), Expression::int(9), len)
            .subscript(int("j"))
            .eq(a.subscript(int("j"))),
    );
    assert_valid(&mut v, &goal);
}

#[test]
fn length_follows_the_companion_variable() {
    let mut v = verifier();
    let (a, len) = array("a", AtomicType::Float);
    assert_valid(&mut v, &a.clone().length().eq(Expression::var(len.clone())));

    let updated = a.update(Expression::int(0), Expression::float(2.5), len.clone());
    assert_valid(&mut v, &updated.length().eq(Expression::var(len)));
}

#[test]
fn quantified_goals() {
    let mut v = verifier();
    let total = Expression::forall(
        vec!["x".into()],
        int("x").ge(Expression::int(0)).or(int("x").lt(Expression::int(0))),
    );
    assert_valid(&mut v, &total);

    let empty_window = Expression::exists(
        vec!["x".into()],
        int("x").gt(Expression::int(10)).and(int("x").lt(Expression::int(10))),
    )
    .not();
    assert_valid(&mut v, &empty_window);

    let too_strong = Expression::forall(vec!["x".into()], int("x").gt(Expression::int(0)));
    assert!(v.check_valid(&too_strong).unwrap().is_some());
}

#[test]
fn mixed_int_real_arithmetic() {
    let mut v = verifier();
    assert_valid(&mut v, &int("x").add(Expression::float(0.5)).gt(int("x")));
    let halves = float("r")
        .float_div(Expression::int(2))
        .add(float("r").float_div(Expression::int(2)))
        .eq(float("r"));
    assert_valid(&mut v, &halves);
}

#[test]
fn float_constants_of_extreme_magnitude_are_decided() {
    let mut v = verifier();
    let big = Expression::float(1e19);
    let split = float("f")
        .gt(big.clone())
        .or(float("f").le(big.clone()));
    assert_valid(&mut v, &split);
    assert_valid(&mut v, &Expression::float(1e-19).gt(Expression::int(0)));
    assert_valid(
        &mut v,
        &Expression::float(1e300)
            .add(Expression::int(1))
            .gt(Expression::float(1e300)),
    );

    let cm = assert_refuted(&mut v, &float("f").lt(big));
    assert!(cm.get("f").is_some());
}

#[test]
fn non_finite_float_constants_are_fatal() {
    let mut v = verifier();
    let goal = float("f").lt(Expression::float(f64::INFINITY));
    assert!(matches!(
        v.check_valid(&goal),
        Err(VerifyError::Encode(EncodeError::NonFiniteFloat(_)))
    ));
}

#[test]
fn names_that_cannot_be_printed_never_reach_the_solver() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("query.smt2");
    let mut v = verifier_with(VerifierOptions {
        dump_smt: Some(path.to_string_lossy().into_owned()),
        ..Default::default()
    });
    let goal = int("x|y").ge(Expression::int(0));
    assert!(matches!(
        v.check_valid(&goal),
        Err(VerifyError::Encode(EncodeError::InvalidName(name))) if name == "x|y"
    ));
    assert!(!path.exists());
}

#[test]
fn integer_division_and_modulo() {
    let mut v = verifier();
    let nonneg = int("x").ge(Expression::int(0));
    let floor = nonneg.clone().implies(
        int("x")
            .div(Expression::int(2))
            .mul(Expression::int(2))
            .le(int("x")),
    );
    assert_valid(&mut v, &floor);
    let remainder = int("x")
        .modulo(Expression::int(3))
        .ge(Expression::int(0))
        .and(int("x").modulo(Expression::int(3)).lt(Expression::int(3)));
    assert_valid(&mut v, &remainder);
}

#[test]
fn modulo_on_a_real_operand_is_fatal() {
    let mut v = verifier();
    let goal = float("r").modulo(Expression::int(2)).eq(Expression::int(0));
    let err = v.check_valid(&goal).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Encode(EncodeError::SortMismatch { .. })
    ));
}

#[test]
fn one_name_at_two_sorts_is_fatal() {
    let mut v = verifier();
    let goal = int("x").gt(Expression::int(0)).or(boolean("x"));
    let err = v.check_valid(&goal).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Encode(EncodeError::ConflictingSorts { ref name, .. }) if name == "x"
    ));
}

#[test]
fn non_boolean_goal_is_fatal() {
    let mut v = verifier();
    assert!(matches!(
        v.check_valid(&int("x").add(Expression::int(1))),
        Err(VerifyError::Encode(EncodeError::SortMismatch { .. }))
    ));
}

#[test]
fn simplification_does_not_change_verdicts() {
    let goals = [
        Expression::bool(true).and(int("x").gt(Expression::int(0))),
        Expression::int(2).add(Expression::int(3)).eq(Expression::int(5)),
        Expression::bool(false).implies(int("x").lt(int("x"))),
    ];
    let mut with = verifier();
    let mut without = verifier_with(VerifierOptions {
        simplify: false,
        ..Default::default()
    });
    for goal in &goals {
        assert_eq!(
            with.check_valid(goal).unwrap().is_none(),
            without.check_valid(goal).unwrap().is_none(),
            "verdicts differ for {goal}"
        );
    }
}

#[test]
fn query_dump_is_a_standalone_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("query.smt2");
    let mut v = verifier_with(VerifierOptions {
        dump_smt: Some(path.to_string_lossy().into_owned()),
        ..Default::default()
    });
    assert_refuted(&mut v, &int("x").gt(Expression::int(0)));

    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.contains("(declare-const x Int)"));
    assert!(script.contains("(assert (not (> x 0)))"));
    assert!(script.trim_end().ends_with("(check-sat)"));
}

#[test]
fn unwritable_dump_path_does_not_fail_the_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("query.smt2");
    let mut v = verifier_with(VerifierOptions {
        dump_smt: Some(path.to_string_lossy().into_owned()),
        ..Default::default()
    });
    assert_valid(&mut v, &Expression::bool(true));
    assert!(!path.exists());
}

#[test]
fn counter_model_serializes_to_json() {
    let mut v = verifier();
    let cm = assert_refuted(&mut v, &int("x").eq(Expression::int(3)));
    let json = serde_json::to_value(&cm).unwrap();
    assert!(json["assignments"]["x"].is_string());
    assert!(json.get("inconclusive_reason").is_none());
}
