//! Typed decision results and per-rule trace metadata.

use dmn_core::Value;

/// Output variable snapshot carried by a single result.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputValue {
    pub name: String,
    pub value: Value,
    pub type_ref: Option<String>,
}

/// Which rule produced a result.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRule {
    pub index: usize,
    pub name: Option<String>,
}

/// Per-rule input-cell evaluation, kept for tracing.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvaluation {
    pub rule_index: usize,
    pub variable: String,
    pub entry: String,
    pub matched: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SingleResult {
    pub outputs: Vec<OutputValue>,
    pub hit_rules: Vec<HitRule>,
    pub input_evaluations: Vec<InputEvaluation>,
}

impl SingleResult {
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.iter().find(|o| o.name == name).map(|o| &o.value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecisionResult {
    pub results: Vec<SingleResult>,
}

impl DecisionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(result: SingleResult) -> Self {
        Self {
            results: vec![result],
        }
    }

    pub fn has_result(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn is_single_result(&self) -> bool {
        self.results.len() == 1
    }

    pub fn first(&self) -> Option<&SingleResult> {
        self.results.first()
    }

    /// Convenience accessor: the named output of the first result.
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.first().and_then(|r| r.output(name))
    }
}
