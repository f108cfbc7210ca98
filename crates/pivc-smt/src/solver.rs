use indexmap::IndexMap;

use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

/// Result of a satisfiability check.
#[derive(Debug, Clone, PartialEq)]
pub enum SatResult {
    Sat,
    Unsat,
    /// The solver gave up; carries its reason.
    Unknown(String),
}

/// Constant assignments reported by the solver.
///
/// Values are kept in the solver's own textual rendering (SMT-LIB syntax,
/// e.g. `5`, `(- 3)`, `(/ 1 2)`, `true`), in the order the solver listed
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub values: IndexMap<String, String>,
}

impl Model {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        parse_int(self.get(name)?)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse an SMT-LIB integer numeral, either `n` or `(- n)`.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("(-").and_then(|t| t.strip_suffix(')')) {
        return format!("-{}", inner.trim()).parse().ok();
    }
    text.parse().ok()
}

/// Abstract SMT solver interface.
pub trait SmtSolver {
    type Error: std::error::Error;

    /// Declare a new constant.
    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Self::Error>;

    /// Assert a constraint.
    fn assert(&mut self, term: &SmtTerm) -> Result<(), Self::Error>;

    /// Check satisfiability.
    fn check_sat(&mut self) -> Result<SatResult, Self::Error>;

    /// Check satisfiability and extract a model when one is available.
    ///
    /// A model may accompany `Unknown` as well as `Sat`; it then describes
    /// the candidate the solver stopped at.
    fn check_sat_with_model(&mut self) -> Result<(SatResult, Option<Model>), Self::Error>;

    /// Drop all declarations and assertions.
    fn reset(&mut self) -> Result<(), Self::Error>;
}
