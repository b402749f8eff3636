/// Failures while building a [`Definition`](crate::Definition) from a
/// parsed model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("duplicate decision name '{0}'")]
    DuplicateDecision(String),
    #[error("decision '{decision}' requires unknown element id '{id}'")]
    UnknownRequirement { decision: String, id: String },
    #[error("decision graph contains a cycle through '{0}'")]
    CyclicDependency(String),
    #[error("variable name '{0}' cannot be normalised")]
    UnusableName(String),
    #[error("unknown hit policy '{0}'")]
    UnknownHitPolicy(String),
    #[error("unknown collect aggregation '{0}'")]
    UnknownAggregation(String),
    #[error("rule {rule} of decision '{decision}' has {found} {kind} entries, expected {expected}")]
    RuleArityMismatch {
        decision: String,
        rule: usize,
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;
