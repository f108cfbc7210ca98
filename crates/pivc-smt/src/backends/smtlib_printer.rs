use num::rational::BigRational;
use num::Signed;

use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

/// Print an SmtTerm as SMT-LIB2 format.
pub fn to_smtlib(term: &SmtTerm) -> String {
    let bin = |op: &str, lhs: &SmtTerm, rhs: &SmtTerm| {
        format!("({op} {} {})", to_smtlib(lhs), to_smtlib(rhs))
    };
    match term {
        SmtTerm::Var(name, _) => symbol(name),
        SmtTerm::IntLit(n) => {
            if *n < 0 {
                format!("(- {})", n.unsigned_abs())
            } else {
                n.to_string()
            }
        }
        SmtTerm::RealLit(value) => real_literal(value),
        SmtTerm::BoolLit(b) => b.to_string(),
        SmtTerm::Add(lhs, rhs) => bin("+", lhs, rhs),
        SmtTerm::Sub(lhs, rhs) => bin("-", lhs, rhs),
        SmtTerm::Mul(lhs, rhs) => bin("*", lhs, rhs),
        SmtTerm::IntDiv(lhs, rhs) => bin("div", lhs, rhs),
        SmtTerm::RealDiv(lhs, rhs) => bin("/", lhs, rhs),
        SmtTerm::Mod(lhs, rhs) => bin("mod", lhs, rhs),
        SmtTerm::Neg(inner) => format!("(- {})", to_smtlib(inner)),
        SmtTerm::ToReal(inner) => format!("(to_real {})", to_smtlib(inner)),
        SmtTerm::Eq(lhs, rhs) => bin("=", lhs, rhs),
        SmtTerm::Lt(lhs, rhs) => bin("<", lhs, rhs),
        SmtTerm::Le(lhs, rhs) => bin("<=", lhs, rhs),
        SmtTerm::Gt(lhs, rhs) => bin(">", lhs, rhs),
        SmtTerm::Ge(lhs, rhs) => bin(">=", lhs, rhs),
        SmtTerm::And(terms) => nary("and", "true", terms),
        SmtTerm::Or(terms) => nary("or", "false", terms),
        SmtTerm::Not(inner) => format!("(not {})", to_smtlib(inner)),
        SmtTerm::Implies(lhs, rhs) => bin("=>", lhs, rhs),
        SmtTerm::Iff(lhs, rhs) => bin("=", lhs, rhs),
        SmtTerm::Select(array, index) => bin("select", array, index),
        SmtTerm::Store(array, index, value) => format!(
            "(store {} {} {})",
            to_smtlib(array),
            to_smtlib(index),
            to_smtlib(value)
        ),
        SmtTerm::ForAll(bindings, body) => quantified("forall", bindings, body),
        SmtTerm::Exists(bindings, body) => quantified("exists", bindings, body),
    }
}

/// Print a sort as SMT-LIB2 format.
pub fn sort_to_smtlib(sort: &SmtSort) -> String {
    sort.to_string()
}

/// Whether `name` can be written as an SMT-LIB symbol at all. Quoted
/// symbols cannot contain `|` or `\`.
pub fn is_expressible_symbol(name: &str) -> bool {
    !name.contains(['|', '\\'])
}

/// Quote a constant name unless it is a plain SMT-LIB simple symbol.
///
/// `name` must satisfy [`is_expressible_symbol`]; the encoder rejects every
/// other name before a term reaches a printer.
pub fn symbol(name: &str) -> String {
    let simple = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "~!@$%^&*_-+=<>.?/".contains(c));
    if simple {
        name.to_string()
    } else {
        format!("|{name}|")
    }
}

/// Self-contained SMT-LIB2 script for one query: declarations, assertions
/// and a trailing `(check-sat)`.
pub fn query_to_smt2_script(declarations: &[(String, SmtSort)], assertions: &[SmtTerm]) -> String {
    let mut script = String::from("(set-logic ALL)\n");
    for (name, sort) in declarations {
        script.push_str(&format!(
            "(declare-const {} {})\n",
            symbol(name),
            sort_to_smtlib(sort)
        ));
    }
    for assertion in assertions {
        script.push_str(&format!("(assert {})\n", to_smtlib(assertion)));
    }
    script.push_str("(check-sat)\n");
    script
}

fn nary(op: &str, unit: &str, terms: &[SmtTerm]) -> String {
    match terms {
        [] => unit.to_string(),
        [single] => to_smtlib(single),
        _ => {
            let inner: Vec<String> = terms.iter().map(to_smtlib).collect();
            format!("({op} {})", inner.join(" "))
        }
    }
}

fn quantified(q: &str, bindings: &[(String, SmtSort)], body: &SmtTerm) -> String {
    let vars: Vec<String> = bindings
        .iter()
        .map(|(n, s)| format!("({} {s})", symbol(n)))
        .collect();
    format!("({q} ({}) {})", vars.join(" "), to_smtlib(body))
}

fn real_literal(value: &BigRational) -> String {
    let numer = value.numer().magnitude();
    let magnitude = if value.is_integer() {
        format!("{numer}.0")
    } else {
        format!("(/ {numer}.0 {}.0)", value.denom())
    };
    if value.is_negative() {
        format!("(- {magnitude})")
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_simple_term() {
        let term = SmtTerm::int_var("x").add(SmtTerm::int(1)).ge(SmtTerm::int(0));
        assert_eq!(to_smtlib(&term), "(>= (+ x 1) 0)");
    }

    #[test]
    fn print_and_term() {
        let term = SmtTerm::and(vec![
            SmtTerm::int_var("a").gt(SmtTerm::int(0)),
            SmtTerm::int_var("b").lt(SmtTerm::int(-10)),
        ]);
        assert_eq!(to_smtlib(&term), "(and (> a 0) (< b (- 10)))");
    }

    #[test]
    fn print_real_literals() {
        assert_eq!(to_smtlib(&SmtTerm::real(3, 1)), "3.0");
        assert_eq!(to_smtlib(&SmtTerm::real(-9, 4)), "(- (/ 9.0 4.0))");
        assert_eq!(to_smtlib(&SmtTerm::real(0, 1)), "0.0");
    }

    #[test]
    fn print_arrays_and_quantifiers() {
        let a = SmtTerm::var("a", SmtSort::array(SmtSort::Bool));
        let term = SmtTerm::ForAll(
            vec![("i".into(), SmtSort::Int)],
            Box::new(a.store(SmtTerm::int_var("i"), SmtTerm::bool(true)).select(SmtTerm::int_var("i"))),
        );
        assert_eq!(to_smtlib(&term), "(forall ((i Int)) (select (store a i true) i))");
    }

    #[test]
    fn symbols_are_quoted_when_needed() {
        assert_eq!(symbol("a.length"), "a.length");
        assert_eq!(symbol("k!0"), "k!0");
        assert_eq!(symbol("has space"), "|has space|");
        assert_eq!(symbol("1st"), "|1st|");
    }

    #[test]
    fn bars_and_backslashes_cannot_be_quoted() {
        assert!(is_expressible_symbol("has space"));
        assert!(is_expressible_symbol("a.length"));
        assert!(!is_expressible_symbol("a|b"));
        assert!(!is_expressible_symbol("a\\b"));
    }

    #[test]
    fn script_declares_then_asserts() {
        let script = query_to_smt2_script(
            &[("x".to_string(), SmtSort::Int)],
            &[SmtTerm::int_var("x").gt(SmtTerm::int(0)).not()],
        );
        assert_eq!(
            script,
            "(set-logic ALL)\n(declare-const x Int)\n(assert (not (> x 0)))\n(check-sat)\n"
        );
    }
}
