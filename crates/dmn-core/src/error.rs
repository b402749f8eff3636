use derive_more::From;
use dmn_feel::ParseError;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CoreReason {
    #[error("feel parse error: {0}")]
    Parse(ParseError),
    #[error("invalid argument")]
    InvalidArgument,
    #[error("evaluation error")]
    Evaluation,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CoreReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Parse(_) => 2001,
            Self::InvalidArgument => 2002,
            Self::Evaluation => 2003,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type CoreError = StructError<CoreReason>;
pub type CoreResult<T> = Result<T, CoreError>;
