use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum RuntimeReason {
    #[error("decision not found")]
    DecisionNotFound,
    #[error("input parameter not found")]
    InputParameterNotFound,
    #[error("variable is write-protected")]
    ProtectedVariable,
    #[error("hit policy violation")]
    HitPolicyViolation,
    #[error("expression evaluation failed")]
    Expression,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for RuntimeReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::DecisionNotFound => 3001,
            Self::InputParameterNotFound => 3002,
            Self::ProtectedVariable => 3003,
            Self::HitPolicyViolation => 3004,
            Self::Expression => 3005,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type RuntimeError = StructError<RuntimeReason>;
pub type RuntimeResult<T> = Result<T, RuntimeError>;
