pub mod builtins;
pub mod engine;
pub mod eval;
pub mod temporal;
pub mod value;

mod error;

pub use engine::FeelEngine;
pub use error::{CoreError, CoreReason, CoreResult};
pub use eval::{EvalContext, Scope, ScopeHandle, evaluate};
pub use value::{FeelTime, FeelType, FunctionValue, RangeValue, Value};
