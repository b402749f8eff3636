pub mod cache;
pub mod context;
pub mod executor;
pub mod options;
pub mod result;
pub mod snapshot;

mod error;

pub use cache::{AstCache, purge_definition_cache, purge_global_cache};
pub use context::DmnExecutionContext;
pub use error::{RuntimeError, RuntimeReason, RuntimeResult};
pub use executor::DecisionExecutor;
pub use options::{CacheScope, EvaluationOptions};
pub use result::{DecisionResult, HitRule, InputEvaluation, OutputValue, SingleResult};
pub use snapshot::Snapshot;
