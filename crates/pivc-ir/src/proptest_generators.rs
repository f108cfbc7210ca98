//! Proptest strategies for generating well-sorted expressions.

use proptest::prelude::*;

use crate::expression::{BinaryOp, Expression};
use crate::types::Variable;

/// Integer variable names used by the generators.
pub const INT_VARS: [&str; 3] = ["x", "y", "z"];

/// Strategy for integer-sorted linear expressions over [`INT_VARS`].
///
/// Generated terms stay linear: multiplication always has a literal on one
/// side, so every query lands in linear integer arithmetic.
pub fn arb_int_expression() -> impl Strategy<Value = Expression> {
    let leaf = prop_oneof![
        (-20i64..=20).prop_map(Expression::int),
        proptest::sample::select(INT_VARS.to_vec()).prop_map(|n| Expression::var(Variable::int(n))),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.add(r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.sub(r)),
            (inner.clone(), -5i64..=5).prop_map(|(l, k)| l.mul(Expression::int(k))),
            inner.prop_map(Expression::neg),
        ]
    })
}

/// Strategy for boolean-sorted formulas built from comparisons of
/// [`arb_int_expression`] terms.
pub fn arb_bool_expression() -> impl Strategy<Value = Expression> {
    let cmp = prop_oneof![
        Just(BinaryOp::Lt),
        Just(BinaryOp::Le),
        Just(BinaryOp::Gt),
        Just(BinaryOp::Ge),
        Just(BinaryOp::Eq),
        Just(BinaryOp::Ne),
    ];
    let atom = (cmp, arb_int_expression(), arb_int_expression())
        .prop_map(|(op, l, r)| Expression::binary(op, l, r));
    atom.prop_recursive(3, 16, 2, |inner| {
        let connective = prop_oneof![
            Just(BinaryOp::And),
            Just(BinaryOp::Or),
            Just(BinaryOp::Implies),
            Just(BinaryOp::Iff),
        ];
        prop_oneof![
            (connective, inner.clone(), inner.clone())
                .prop_map(|(op, l, r)| Expression::binary(op, l, r)),
            inner.prop_map(Expression::not),
        ]
    })
}
