//! JSON-RPC error mapping.

use opdir_log::LogError;
use opdir_remote::wire::{
    CONFLICT, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
    REJECTED,
};

/// Errors returned by JSON-RPC handlers.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The log refused the records.
    #[error("{0}")]
    Rejected(String),

    /// A concurrent writer won; retry against the new tip.
    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    /// JSON-RPC error code.
    pub fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => PARSE_ERROR,
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::Rejected(_) => REJECTED,
            Self::Conflict(_) => CONFLICT,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl From<LogError> for RpcError {
    fn from(e: LogError) -> Self {
        match e {
            e if e.is_conflict() => Self::Conflict(e.to_string()),
            LogError::Store(e) => Self::Internal(e.to_string()),
            e => Self::Rejected(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for RpcError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(e.to_string())
    }
}
