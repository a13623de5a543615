use serde_json::Value;
use uuid::Uuid;

use crate::queue::Queue;

#[derive(Debug, Clone)]
pub struct IngestionEvent {
    pub tenant_id: String,
    pub integration_id: String,
    pub provider_id: String,
    pub raw_record: Value,
}

#[derive(Debug, Clone)]
pub struct ShardEmission {
    pub tenant_id: String,
    pub shard_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct EnrichmentJob {
    pub tenant_id: String,
    pub shard_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundOperation {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
pub struct SyncOutbound {
    pub tenant_id: String,
    pub integration_id: String,
    pub external_id: String,
    pub operation: OutboundOperation,
    pub payload: Value,
}

/// The named queues from the external interface layout, wired together so a
/// worker constructed with a `QueueBus` can publish to the next stage without
/// needing a reference to that stage's struct. `shard-created` fan-out is the
/// shard store's own change feed (subscribed to directly by the resolver and
/// insight engine), not a separate queue here.
pub struct QueueBus {
    pub ingestion_events: Queue<IngestionEvent>,
    pub shard_emission: Queue<ShardEmission>,
    pub enrichment_jobs: Queue<EnrichmentJob>,
    pub sync_outbound: Queue<SyncOutbound>,
}

impl QueueBus {
    pub fn new() -> Self {
        Self {
            ingestion_events: Queue::new("ingestion-events", 1024),
            shard_emission: Queue::new("shard-emission", 1024),
            enrichment_jobs: Queue::new("enrichment-jobs", 1024),
            sync_outbound: Queue::new("sync-outbound", 1024),
        }
    }
}

impl Default for QueueBus {
    fn default() -> Self {
        Self::new()
    }
}
