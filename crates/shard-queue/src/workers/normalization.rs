use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use shard_conversion::{convert, ConversionSchema};
use shard_core::{Shard, ShardMetadata, ShardStatus};
use shard_governance::RedactionRegistry;
use shard_store::Backend;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bus::{IngestionEvent, QueueBus, ShardEmission};
use crate::queue::SeenSet;

/// Consumes `ingestion-events`, converts each raw record through the schema
/// registered for its provider, applies the tenant's redaction policy before
/// the shard ever touches storage, persists it, and forwards a
/// `ShardEmission` so enrichment can pick it up. Idempotent against
/// redelivery via `SeenSet` keyed by the conversion's dedup key.
pub struct NormalizationWorker {
    store: Arc<dyn Backend>,
    schemas: HashMap<String, ConversionSchema>,
    redactions: RedactionRegistry,
    seen: SeenSet,
}

impl NormalizationWorker {
    pub fn new(
        store: Arc<dyn Backend>,
        schemas: HashMap<String, ConversionSchema>,
        redactions: RedactionRegistry,
    ) -> Self {
        Self {
            store,
            schemas,
            redactions,
            seen: SeenSet::new(),
        }
    }

    async fn handle(&self, event: IngestionEvent, bus: &QueueBus) {
        let schema_key = format!("{}:default", event.provider_id);
        let Some(schema) = self.schemas.get(&schema_key) else {
            warn!(provider_id = %event.provider_id, "no conversion schema registered");
            return;
        };

        let converted = match convert(schema, &event.raw_record) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "conversion failed");
                return;
            }
        };

        let idempotency_key = format!("{}:{}:{}", event.tenant_id, event.integration_id, converted.dedup_key);
        if !self.seen.mark_if_new(&idempotency_key) {
            return;
        }

        let mut structured_data = converted.structured_data;
        let policy = self.redactions.policy_for(&event.tenant_id);
        let redactions = policy.apply(&mut structured_data);

        let shard = Shard {
            shard_id: Uuid::new_v4(),
            tenant_id: event.tenant_id.clone(),
            shard_type: schema.shard_type.clone(),
            version: 1,
            status: ShardStatus::Active,
            project_id: None,
            structured_data,
            searchable_text: converted.searchable_text,
            embedding: None,
            source_provider_id: Some(event.provider_id.clone()),
            source_integration_id: Some(event.integration_id.clone()),
            source_external_id: Some(converted.dedup_key),
            provenance: vec![],
            metadata: ShardMetadata {
                redactions,
                acl: vec![],
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let shard_id = shard.shard_id;

        if let Err(e) = self.store.put_shard(shard).await {
            warn!(error = %e, "failed to persist normalized shard");
            return;
        }

        info!(shard_id = %shard_id, "normalized shard persisted");
        let _ = bus
            .shard_emission
            .publish(ShardEmission {
                tenant_id: event.tenant_id,
                shard_id,
            })
            .await;
    }

    pub async fn run(self: Arc<Self>, bus: Arc<QueueBus>) {
        while let Some(event) = bus.ingestion_events.consume().await {
            self.handle(event, &bus).await;
        }
    }
}
