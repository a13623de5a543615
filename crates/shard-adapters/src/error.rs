use shard_core::{ErrorClass, SyncError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("retryable: {0}")]
    Retryable(String),
    #[error("auth: {0}")]
    Auth(String),
    #[error("fatal: {0}")]
    Fatal(String),
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("circuit open for {0}")]
    CircuitOpen(String),
}

impl AdapterError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AdapterError::Retryable(_) | AdapterError::RateLimited { .. } => ErrorClass::Retryable,
            AdapterError::Auth(_) => ErrorClass::Auth,
            AdapterError::Fatal(_) | AdapterError::CircuitOpen(_) => ErrorClass::Fatal,
        }
    }
}

impl From<AdapterError> for SyncError {
    fn from(e: AdapterError) -> Self {
        match e.class() {
            ErrorClass::Retryable => SyncError::Retryable(e.to_string()),
            ErrorClass::Auth => SyncError::Auth(e.to_string()),
            ErrorClass::Fatal => SyncError::Fatal(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            AdapterError::Retryable(e.to_string())
        } else if e.status().map(|s| s.as_u16() == 401 || s.as_u16() == 403).unwrap_or(false) {
            AdapterError::Auth(e.to_string())
        } else {
            AdapterError::Retryable(e.to_string())
        }
    }
}
