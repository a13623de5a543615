use thiserror::Error;

/// Root error type for the sync engine. Per-crate error enums convert into this
/// at module boundaries via `#[from]` so callers crossing a crate edge see one
/// vocabulary instead of chasing nested `Box<dyn Error>`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transient failure, retry: {0}")]
    Retryable(String),

    #[error("auth failure: {0}")]
    Auth(String),

    #[error("fatal, do not retry: {0}")]
    Fatal(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Classification used by the adapter framework's retry/backoff logic and the
/// circuit breaker. A `SyncError` maps to exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Retryable,
    Auth,
    Fatal,
}

impl SyncError {
    pub fn class(&self) -> ErrorClass {
        match self {
            SyncError::Retryable(_) | SyncError::Storage(_) | SyncError::Serde(_) => {
                ErrorClass::Retryable
            }
            SyncError::Auth(_) => ErrorClass::Auth,
            SyncError::Fatal(_) | SyncError::NotFound(_) | SyncError::Validation(_) => {
                ErrorClass::Fatal
            }
            SyncError::Config(_) => ErrorClass::Fatal,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
