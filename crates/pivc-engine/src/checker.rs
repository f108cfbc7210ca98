//! Validity checking: a goal is valid iff its negation is unsatisfiable.

use std::time::Instant;

use pivc_ir::expression::Expression;
use pivc_smt::backends::smtlib_printer::query_to_smt2_script;
use pivc_smt::encoder::{declarations, encode_formula};
use pivc_smt::predicates::PredicateRegistry;
use pivc_smt::simplify::simplify;
use pivc_smt::solver::{SatResult, SmtSolver};
use pivc_smt::sorts::SmtSort;
use pivc_smt::terms::SmtTerm;
use tracing::{info, warn};

use crate::counter_model::CounterModel;
use crate::error::VerifyError;
use crate::options::VerifierOptions;

/// Decide validity of `expr` with one solver query.
///
/// Returns `None` when the goal is valid. Otherwise returns a counter-model:
/// a falsifying assignment when the solver found one, or an inconclusive
/// counter-model (see [`CounterModel::inconclusive_reason`]) when it gave up.
///
/// The solver is reset first, so no declaration or assertion from an earlier
/// check leaks into this one.
pub fn check_valid<S: SmtSolver>(
    solver: &mut S,
    registry: &PredicateRegistry,
    expr: &Expression,
    options: &VerifierOptions,
) -> Result<Option<CounterModel>, VerifyError> {
    let started = Instant::now();
    let goal = encode_formula(expr, registry)?;
    let goal = if options.simplify { simplify(&goal) } else { goal };
    let query = goal.not();
    let decls = declarations(&query)?;
    let encode_ms = started.elapsed().as_millis() as u64;

    if let Some(path) = &options.dump_smt {
        dump_smt_to_file(&decls, &query, path);
    }

    solver.reset().map_err(solver_error)?;
    for (name, sort) in &decls {
        solver.declare_var(name, sort).map_err(solver_error)?;
    }
    solver.assert(&query).map_err(solver_error)?;

    let solve_started = Instant::now();
    let (result, model) = solver.check_sat_with_model().map_err(solver_error)?;
    let solve_ms = solve_started.elapsed().as_millis() as u64;

    let verdict = match &result {
        SatResult::Unsat => "valid",
        SatResult::Sat => "invalid",
        SatResult::Unknown(_) => "unknown",
    };
    info!(verdict, encode_ms, solve_ms, consts = decls.len(), "checked goal");

    Ok(match result {
        SatResult::Unsat => None,
        SatResult::Sat => Some(CounterModel::refuting(model)),
        SatResult::Unknown(reason) => Some(CounterModel::inconclusive(model, reason)),
    })
}

fn solver_error<E: std::error::Error>(e: E) -> VerifyError {
    VerifyError::Solver(e.to_string())
}

/// Write the exact query as a standalone SMT-LIB2 script. Failure to write
/// is logged and otherwise ignored.
fn dump_smt_to_file(decls: &[(String, SmtSort)], query: &SmtTerm, path: &str) {
    let smt = query_to_smt2_script(decls, std::slice::from_ref(query));
    if let Err(e) = std::fs::write(path, smt) {
        warn!("could not write SMT dump to {path}: {e}");
    } else {
        info!("SMT dump written to {path}");
    }
}
