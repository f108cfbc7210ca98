use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

use crate::backends::smtlib_printer::{sort_to_smtlib, symbol, to_smtlib};
use crate::solver::{Model, SatResult, SmtSolver};
use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

#[derive(Debug, Error)]
pub enum Cvc5Error {
    #[error("cvc5 I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cvc5 not found: {0}")]
    NotFound(String),
    #[error("cvc5 error: {0}")]
    SolverError(String),
    #[error("Sort mismatch for variable {0}")]
    SortMismatch(String),
    #[error("cvc5 session unusable after an earlier failure: {0}")]
    Poisoned(String),
}

/// cvc5 driven as an SMT-LIB2 subprocess.
///
/// Once a response cannot be matched to its command the pipe may still hold
/// stale output, so the session is poisoned and every later call fails.
pub struct Cvc5Solver {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr: BufReader<ChildStderr>,
    vars: HashMap<String, SmtSort>,
    poisoned: Option<String>,
}

impl Cvc5Solver {
    pub fn new() -> Result<Self, Cvc5Error> {
        Self::with_command("cvc5")
    }

    pub fn with_command(cmd: &str) -> Result<Self, Cvc5Error> {
        let args = ["--lang", "smt2", "--incremental", "--produce-models"];

        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Cvc5Error::NotFound(format!("{cmd}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Cvc5Error::SolverError("failed to capture cvc5 stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Cvc5Error::SolverError("failed to capture cvc5 stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Cvc5Error::SolverError("failed to capture cvc5 stderr".into()))?;

        let mut solver = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr: BufReader::new(stderr),
            vars: HashMap::new(),
            poisoned: None,
        };

        // Arrays, reals and quantifiers all occur; no narrower logic fits.
        solver.send_command_no_response("(set-logic ALL)")?;
        Ok(solver)
    }

    /// Send a command and read one complete s-expression (or atom) back.
    fn send_command(&mut self, cmd: &str) -> Result<String, Cvc5Error> {
        writeln!(self.stdin, "{cmd}")?;
        self.stdin.flush()?;

        let mut response = String::new();
        let mut depth: i64 = 0;
        loop {
            let mut line = String::new();
            if self.stdout.read_line(&mut line)? == 0 {
                let mut stderr = String::new();
                let _ = self.stderr.read_line(&mut stderr);
                return Err(self.poison(format!(
                    "No response from cvc5 for command `{cmd}`. stderr: {}",
                    stderr.trim()
                )));
            }
            depth += paren_balance(&line);
            response.push_str(&line);
            if depth <= 0 && !response.trim().is_empty() {
                break;
            }
        }
        Ok(response.trim().to_string())
    }

    fn poison(&mut self, message: String) -> Cvc5Error {
        warn!(error = %message, "cvc5 session poisoned");
        self.poisoned = Some(message.clone());
        Cvc5Error::SolverError(message)
    }

    fn ensure_usable(&self) -> Result<(), Cvc5Error> {
        match &self.poisoned {
            Some(reason) => Err(Cvc5Error::Poisoned(reason.clone())),
            None => Ok(()),
        }
    }

    fn send_command_no_response(&mut self, cmd: &str) -> Result<(), Cvc5Error> {
        writeln!(self.stdin, "{cmd}")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn reason_unknown(&mut self) -> String {
        match self.send_command("(get-info :reason-unknown)") {
            Ok(response) if !response.starts_with("(error") => response
                .trim_start_matches('(')
                .trim_end_matches(')')
                .trim_start_matches(":reason-unknown")
                .trim()
                .to_string(),
            _ => "cvc5 returned unknown".into(),
        }
    }

    fn get_model(&mut self) -> Result<Option<Model>, Cvc5Error> {
        let response = self.send_command("(get-model)")?;
        if response.starts_with("(error") {
            debug!(response = %response, "cvc5 has no model");
            return Ok(None);
        }
        Ok(Some(parse_model(&response)))
    }
}

impl Drop for Cvc5Solver {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "(exit)");
        let _ = self.stdin.flush();
        let _ = self.child.wait();
    }
}

impl SmtSolver for Cvc5Solver {
    type Error = Cvc5Error;

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Cvc5Error> {
        self.ensure_usable()?;
        if let Some(declared) = self.vars.get(name) {
            if declared != sort {
                return Err(Cvc5Error::SortMismatch(name.to_string()));
            }
            return Ok(());
        }
        let sort_str = sort_to_smtlib(sort);
        self.send_command_no_response(&format!("(declare-const {} {sort_str})", symbol(name)))?;
        self.vars.insert(name.to_string(), sort.clone());
        Ok(())
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Cvc5Error> {
        self.ensure_usable()?;
        let smt_str = to_smtlib(term);
        self.send_command_no_response(&format!("(assert {smt_str})"))?;
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Cvc5Error> {
        self.ensure_usable()?;
        let response = self.send_command("(check-sat)")?;
        match response.as_str() {
            "sat" => Ok(SatResult::Sat),
            "unsat" => Ok(SatResult::Unsat),
            "unknown" => Ok(SatResult::Unknown(self.reason_unknown())),
            other => Err(self.poison(other.to_string())),
        }
    }

    fn check_sat_with_model(&mut self) -> Result<(SatResult, Option<Model>), Cvc5Error> {
        let result = self.check_sat()?;
        debug!(result = ?result, vars = self.vars.len(), "cvc5 check");
        if result == SatResult::Unsat {
            return Ok((result, None));
        }
        let model = self.get_model()?;
        Ok((result, model))
    }

    fn reset(&mut self) -> Result<(), Cvc5Error> {
        self.ensure_usable()?;
        self.send_command_no_response("(reset-assertions)")?;
        self.vars.clear();
        Ok(())
    }
}

fn paren_balance(text: &str) -> i64 {
    let mut depth = 0;
    let mut quoted = false;
    for ch in text.chars() {
        match ch {
            '|' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Byte offset just past the s-expression starting at `start`.
fn find_sexp_end(input: &str, start: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if start >= bytes.len() || bytes[start] != b'(' {
        return None;
    }

    let mut depth = 1;
    let mut quoted = false;
    let mut i = start + 1;
    while i < bytes.len() && depth > 0 {
        match bytes[i] {
            b'|' => quoted = !quoted,
            b'(' if !quoted => depth += 1,
            b')' if !quoted => depth -= 1,
            _ => {}
        }
        i += 1;
    }

    if depth == 0 {
        Some(i)
    } else {
        None
    }
}

/// Parse a `(get-model)` response. Only nullary `define-fun`s (constants)
/// are kept.
fn parse_model(response: &str) -> Model {
    let mut model = Model::default();
    let mut pos = 0;
    while let Some(offset) = response[pos..].find("(define-fun ") {
        let start = pos + offset;
        let Some(end) = find_sexp_end(response, start) else {
            break;
        };
        let body = &response[start + "(define-fun ".len()..end - 1];
        if let Some((name, value)) = parse_define_fun(body) {
            model.values.insert(name, value);
        }
        pos = end;
    }
    model
}

/// Parse the body of one `define-fun`: `name () Sort value`.
fn parse_define_fun(body: &str) -> Option<(String, String)> {
    let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let (name, rest) = split_token(&normalized)?;
    let rest = rest.trim_start().strip_prefix("()")?.trim_start();
    let (_sort, value) = split_token(rest)?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let name = name.trim_matches('|').to_string();
    Some((name, value.to_string()))
}

/// Split off the first atom or parenthesised s-expression.
fn split_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.starts_with('(') {
        let end = find_sexp_end(input, 0)?;
        return Some((&input[..end], &input[end..]));
    }
    if input.starts_with('|') {
        let close = input[1..].find('|')? + 2;
        return Some((&input[..close], &input[close..]));
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    Some((&input[..end], &input[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_define_fun_scalars() {
        assert_eq!(
            parse_define_fun("x () Int 5"),
            Some(("x".to_string(), "5".to_string()))
        );
        assert_eq!(
            parse_define_fun("x () Int\n    (- 7)"),
            Some(("x".to_string(), "(- 7)".to_string()))
        );
        assert_eq!(
            parse_define_fun("|a b| () Real (/ 1 2)"),
            Some(("a b".to_string(), "(/ 1 2)".to_string()))
        );
    }

    #[test]
    fn parse_define_fun_skips_functions() {
        assert_eq!(parse_define_fun("f ((x Int)) Int x"), None);
    }

    #[test]
    fn parse_define_fun_compound_sort() {
        assert_eq!(
            parse_define_fun("a () (Array Int Bool) ((as const (Array Int Bool)) false)"),
            Some((
                "a".to_string(),
                "((as const (Array Int Bool)) false)".to_string()
            ))
        );
    }

    #[test]
    fn parse_full_model() {
        let response = "(\n(define-fun x () Int (- 3))\n(define-fun flag () Bool true)\n(define-fun a.length () Int 0)\n)";
        let model = parse_model(response);
        assert_eq!(model.get_int("x"), Some(-3));
        assert_eq!(model.get_bool("flag"), Some(true));
        assert_eq!(model.get_int("a.length"), Some(0));
        assert_eq!(model.values.keys().collect::<Vec<_>>(), vec!["x", "flag", "a.length"]);
    }

    #[test]
    fn empty_model_parses_to_nothing() {
        assert!(parse_model("(\n)").is_empty());
    }

    /// A stand-in for cvc5 that answers the first `(check-sat)` with an
    /// error followed by a late `sat`.
    #[cfg(unix)]
    fn misbehaving_solver(dir: &std::path::Path) -> Cvc5Solver {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-cvc5");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             while read -r line; do\n\
               case \"$line\" in\n\
                 '(check-sat)') echo '(error \"unexpected input\")'; echo sat ;;\n\
                 '(exit)') exit 0 ;;\n\
               esac\n\
             done\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let command = script.to_str().unwrap();
        // Spawning a freshly written script can race with other tests' forks (ETXTBSY).
        for _ in 0..10 {
            if let Ok(solver) = Cvc5Solver::with_command(command) {
                return solver;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        Cvc5Solver::with_command(command).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn error_response_poisons_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut solver = misbehaving_solver(dir.path());
        solver.declare_var("x", &SmtSort::Int).unwrap();

        let first = solver.check_sat().unwrap_err();
        assert!(matches!(first, Cvc5Error::SolverError(ref msg) if msg.starts_with("(error")));

        // The late `sat` must never be taken as the answer to a new query.
        assert!(matches!(solver.check_sat(), Err(Cvc5Error::Poisoned(_))));
        assert!(matches!(solver.reset(), Err(Cvc5Error::Poisoned(_))));
        assert!(matches!(
            solver.declare_var("y", &SmtSort::Int),
            Err(Cvc5Error::Poisoned(_))
        ));
    }

    #[test]
    fn paren_balance_ignores_quoted_symbols() {
        assert_eq!(paren_balance("(define-fun |(| () Int"), 1);
        assert_eq!(paren_balance("sat"), 0);
        assert_eq!(paren_balance(")"), -1);
    }
}
