use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("shard not found: {0}")]
    NotFound(uuid::Uuid),
    #[error("tenant mismatch: shard belongs to a different tenant")]
    TenantMismatch,
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
