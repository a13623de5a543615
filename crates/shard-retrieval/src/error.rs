use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("store error: {0}")]
    Store(#[from] shard_store::StoreError),
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),
}
