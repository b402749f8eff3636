use std::collections::HashMap;

use dmn_core::Value;

use crate::result::DecisionResult;

/// Immutable capture of the variable store. Snapshot 0 is the initial
/// state; each later snapshot is taken after a decision completes and also
/// records the decision name and its result.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub index: usize,
    pub decision: Option<String>,
    pub result: Option<DecisionResult>,
    pub variables: HashMap<String, Value>,
}

impl Snapshot {
    pub fn value(&self, variable: &str) -> Option<&Value> {
        self.variables.get(variable)
    }
}
