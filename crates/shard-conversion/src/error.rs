use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("validation failed on field {field}: {reason}")]
    Validation { field: String, reason: String },
    #[error("transform failed on field {field}: {reason}")]
    Transform { field: String, reason: String },
    #[error("lookup missing for field {field}: key {key}")]
    LookupMiss { field: String, key: String },
}
