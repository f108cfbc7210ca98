#![doc = include_str!("../README.md")]

pub mod checker;
pub mod counter_model;
pub mod error;
pub mod options;
pub mod session;

pub use counter_model::CounterModel;
pub use error::VerifyError;
pub use options::{SolverChoice, VerifierOptions};
pub use session::Verifier;
