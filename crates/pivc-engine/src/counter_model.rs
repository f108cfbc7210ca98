use indexmap::IndexMap;
use pivc_smt::solver::{parse_int, Model};
use serde::Serialize;

/// Assignment falsifying a goal, as reported by the solver.
///
/// Values are the solver's SMT-LIB renderings (`5`, `(- 3)`, `(/ 1.0 2.0)`,
/// `true`). A check the solver could not decide also yields a counter-model;
/// it then carries the solver's reason and whatever partial assignment was
/// available, possibly none.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CounterModel {
    assignments: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inconclusive_reason: Option<String>,
}

impl CounterModel {
    pub(crate) fn refuting(model: Option<Model>) -> Self {
        Self {
            assignments: model.map(|m| m.values).unwrap_or_default(),
            inconclusive_reason: None,
        }
    }

    pub(crate) fn inconclusive(model: Option<Model>, reason: String) -> Self {
        Self {
            inconclusive_reason: Some(reason),
            ..Self::refuting(model)
        }
    }

    pub fn assignments(&self) -> &IndexMap<String, String> {
        &self.assignments
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.assignments.get(name).map(String::as_str)
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

    /// Why the solver could not decide, when this is not a genuine refutation.
    pub fn inconclusive_reason(&self) -> Option<&str> {
        self.inconclusive_reason.as_deref()
    }

    pub fn is_inconclusive(&self) -> bool {
        self.inconclusive_reason.is_some()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
