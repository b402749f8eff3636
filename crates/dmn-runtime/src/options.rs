use serde::Deserialize;

/// Scope of parsed-AST cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// A fresh unique prefix on every lookup — store/fetch still happen but
    /// never collide.
    None,
    /// Scoped to one execute call; purged when it returns.
    Execution,
    /// Scoped to the execution context; purged on reset.
    Context,
    /// Shared across contexts derived from the same definition.
    Definition,
    /// Shared across all definitions in the process.
    Global,
}

/// Behaviour switches for one execution context.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    pub cache_scope: CacheScope,
    /// Parse rule cells in parallel before the (sequential, deterministic)
    /// match pass.
    pub parallel_rules: bool,
    /// Parse the output expressions of positive rules in parallel.
    pub parallel_outputs: bool,
    pub record_snapshots: bool,
    /// Propagate input-parameter writes to table-input aliases.
    pub resolve_aliases: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            cache_scope: CacheScope::Definition,
            parallel_rules: false,
            parallel_outputs: false,
            record_snapshots: true,
            resolve_aliases: true,
        }
    }
}
