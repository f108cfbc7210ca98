#![doc = include_str!("../README.md")]

//! pivc intermediate representation.
//!
//! This crate defines the values a verification-condition generator hands to
//! the discharging core: typed variables, the logical expression AST and
//! predicate definitions. Everything here is immutable once built.

pub mod expression;
pub mod predicate;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod types;

pub use expression::{BinaryOp, Expression, Quantifier};
pub use predicate::Predicate;
pub use types::{ArrayType, AtomicType, Type, Variable};
