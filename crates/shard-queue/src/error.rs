use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue closed")]
    Closed,
    #[error("adapter error: {0}")]
    Adapter(#[from] shard_adapters::AdapterError),
    #[error("conversion error: {0}")]
    Conversion(#[from] shard_conversion::ConversionError),
    #[error("store error: {0}")]
    Store(#[from] shard_store::StoreError),
    #[error("retrieval error: {0}")]
    Retrieval(#[from] shard_retrieval::RetrievalError),
}
