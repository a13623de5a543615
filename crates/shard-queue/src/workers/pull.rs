use std::sync::Arc;

use serde_json::Value;
use shard_adapters::AdapterRegistry;
use shard_core::IntegrationInstance;
use tracing::warn;

use crate::bus::{IngestionEvent, QueueBus};
use crate::error::QueueError;

/// Scheduled-pull worker invoked by the scheduler for a leased sync job.
/// Pages through `fetch_records` until the adapter reports no more pages,
/// publishing one `IngestionEvent` per record, and returns the final cursor
/// for the scheduler to persist back onto the integration instance.
pub struct PullWorker {
    registry: Arc<AdapterRegistry>,
}

impl PullWorker {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    pub async fn run_once(
        &self,
        instance: &IntegrationInstance,
        bus: &QueueBus,
    ) -> Result<Option<Value>, QueueError> {
        let adapter = self
            .registry
            .get(&instance.provider_id)
            .ok_or_else(|| QueueError::Adapter(shard_adapters::AdapterError::Fatal(format!(
                "no adapter for provider {}",
                instance.provider_id
            ))))?;

        let mut cursor = instance.cursor.clone();
        loop {
            let page = adapter.fetch_records(instance, cursor.clone()).await?;
            for record in page.records {
                if let Err(e) = bus
                    .ingestion_events
                    .publish(IngestionEvent {
                        tenant_id: instance.tenant_id.clone(),
                        integration_id: instance.integration_id.clone(),
                        provider_id: instance.provider_id.clone(),
                        raw_record: record,
                    })
                    .await
                {
                    warn!(error = %e, "failed to publish ingestion event from pull");
                }
            }
            cursor = page.next_cursor.or(cursor);
            if !page.has_more {
                break;
            }
        }
        Ok(cursor)
    }
}
