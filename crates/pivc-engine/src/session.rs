use pivc_ir::expression::Expression;
use pivc_ir::predicate::Predicate;
use pivc_smt::backends::cvc5_backend::Cvc5Solver;
use pivc_smt::backends::z3_backend::Z3Solver;
use pivc_smt::predicates::PredicateRegistry;
use tracing::debug;

use crate::checker;
use crate::counter_model::CounterModel;
use crate::error::VerifyError;
use crate::options::{SolverChoice, VerifierOptions};

enum Backend {
    Z3(Z3Solver),
    Cvc5(Cvc5Solver),
}

/// One verification session: the registered predicates plus the solver
/// that answers every check.
///
/// Constant names are global to the session. Predicates must be defined
/// before any goal that calls them is checked.
pub struct Verifier {
    registry: PredicateRegistry,
    backend: Backend,
    options: VerifierOptions,
}

impl Verifier {
    pub fn new(options: VerifierOptions) -> Result<Self, VerifyError> {
        let backend = match options.solver {
            SolverChoice::Z3 => Backend::Z3(Z3Solver::new()),
            SolverChoice::Cvc5 => Backend::Cvc5(
                Cvc5Solver::new().map_err(|e| VerifyError::Solver(e.to_string()))?,
            ),
        };
        debug!(solver = %options.solver, "verifier backend ready");
        Ok(Self {
            registry: PredicateRegistry::new(),
            backend,
            options,
        })
    }

    pub fn with_defaults() -> Result<Self, VerifyError> {
        Self::new(VerifierOptions::default())
    }

    /// Register a predicate so later goals can call it.
    pub fn define_predicate(&mut self, predicate: &Predicate) -> Result<(), VerifyError> {
        self.registry.register(predicate)?;
        Ok(())
    }

    /// Check whether `expr` holds for every assignment of its free constants.
    ///
    /// `Ok(None)` means valid. `Ok(Some(_))` means not proved; see
    /// [`checker::check_valid`].
    pub fn check_valid(&mut self, expr: &Expression) -> Result<Option<CounterModel>, VerifyError> {
        match &mut self.backend {
            Backend::Z3(solver) => checker::check_valid(solver, &self.registry, expr, &self.options),
            Backend::Cvc5(solver) => {
                checker::check_valid(solver, &self.registry, expr, &self.options)
            }
        }
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }
}
