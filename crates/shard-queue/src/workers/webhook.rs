use std::sync::Arc;

use serde_json::Value;
use shard_adapters::{AdapterRegistry, WebhookEvent};
use tracing::warn;

use crate::bus::{IngestionEvent, QueueBus};
use crate::error::QueueError;

/// Verifies an inbound webhook against its provider's adapter and fans the
/// payload's records out onto `ingestion-events`, one event per record, so
/// the rest of the pipeline treats webhook pushes and scheduled pulls
/// identically.
pub struct WebhookHandler {
    registry: Arc<AdapterRegistry>,
}

impl WebhookHandler {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    pub async fn handle(
        &self,
        provider_id: &str,
        tenant_id: &str,
        integration_id: &str,
        event: WebhookEvent,
        records: Vec<Value>,
        bus: &QueueBus,
    ) -> Result<(), QueueError> {
        let adapter = self
            .registry
            .get(provider_id)
            .ok_or_else(|| QueueError::Adapter(shard_adapters::AdapterError::Fatal(format!(
                "no adapter for provider {provider_id}"
            ))))?;

        adapter.verify_webhook(&event)?;

        for record in records {
            if let Err(e) = bus
                .ingestion_events
                .publish(IngestionEvent {
                    tenant_id: tenant_id.to_string(),
                    integration_id: integration_id.to_string(),
                    provider_id: provider_id.to_string(),
                    raw_record: record,
                })
                .await
            {
                warn!(error = %e, "failed to publish ingestion event from webhook");
            }
        }
        Ok(())
    }
}
