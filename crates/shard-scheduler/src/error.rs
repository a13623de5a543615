use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("store error: {0}")]
    Store(#[from] shard_store::StoreError),
    #[error("adapter error: {0}")]
    Adapter(#[from] shard_adapters::AdapterError),
    #[error("queue error: {0}")]
    Queue(#[from] shard_queue::QueueError),
    #[error("invalid cron expression: {0}")]
    InvalidCron(String),
}
