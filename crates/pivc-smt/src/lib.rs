#![doc = include_str!("../README.md")]

//! SMT encoding and solver integration for pivc verification conditions.
//!
//! Expressions are encoded into [`terms::SmtTerm`] against a
//! [`predicates::PredicateRegistry`], then handed to a pluggable
//! [`solver::SmtSolver`] backend (Z3 or cvc5).

pub mod backends;
pub mod encoder;
pub mod predicates;
pub mod simplify;
pub mod solver;
pub mod sorts;
pub mod terms;
