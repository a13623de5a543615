pub mod bus;
pub mod entity_extractor;
pub mod error;
pub mod queue;
pub mod workers;

pub use bus::{EnrichmentJob, IngestionEvent, OutboundOperation, QueueBus, ShardEmission, SyncOutbound};
pub use entity_extractor::{EntityExtractor, HeuristicEntityExtractor};
pub use error::QueueError;
pub use queue::{session_key, Queue, SeenSet};
pub use workers::{EnrichmentWorker, NormalizationWorker, PullWorker, WebhookHandler, WriteBackWorker};
