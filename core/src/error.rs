use thiserror::Error;

/// Failures talking to the schools backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("not authorized")]
    Unauthorized,
    /// Duplicate submission; the message is meant to be shown as-is
    #[error("{0}")]
    Conflict(String),
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
    /// The backend answered but reported `success: false`
    #[error("sync rejected: {0}")]
    SyncRejected(String),
}

impl ApiError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
