use std::fmt;
use std::str::FromStr;

use crate::error::VerifyError;

/// Which solver backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverChoice {
    /// Z3 through its C API, in process.
    #[default]
    Z3,
    /// A `cvc5` binary on `PATH`, driven over SMT-LIB2.
    Cvc5,
}

impl fmt::Display for SolverChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverChoice::Z3 => write!(f, "z3"),
            SolverChoice::Cvc5 => write!(f, "cvc5"),
        }
    }
}

impl FromStr for SolverChoice {
    type Err = VerifyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "z3" => Ok(SolverChoice::Z3),
            "cvc5" => Ok(SolverChoice::Cvc5),
            other => Err(VerifyError::Config(format!(
                "Unknown solver '{other}'. Use 'z3' or 'cvc5'."
            ))),
        }
    }
}

/// Options for a verification session.
#[derive(Debug, Clone)]
pub struct VerifierOptions {
    pub solver: SolverChoice,
    /// Simplify each goal before negating it.
    pub simplify: bool,
    /// Write every query as a standalone SMT-LIB2 script to this path.
    pub dump_smt: Option<String>,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            solver: SolverChoice::Z3,
            simplify: true,
            dump_smt: None,
        }
    }
}
