use std::sync::Arc;

use dashmap::DashMap;
use shard_adapters::AdapterRegistry;
use shard_core::IntegrationInstance;
use tokio::sync::Mutex;
use tracing::warn;

use crate::bus::{OutboundOperation, QueueBus, SyncOutbound};
use crate::queue::session_key;

/// Consumes `sync-outbound`, dispatching each message to the adapter
/// registered for its provider. Messages are processed one-at-a-time per
/// `(tenant, integration, external_id)` session key so two near-simultaneous
/// edits to the same external record can never race past each other.
pub struct WriteBackWorker {
    registry: Arc<AdapterRegistry>,
    instances: Arc<dyn Fn(&str, &str) -> Option<IntegrationInstance> + Send + Sync>,
    session_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl WriteBackWorker {
    pub fn new(
        registry: Arc<AdapterRegistry>,
        instances: Arc<dyn Fn(&str, &str) -> Option<IntegrationInstance> + Send + Sync>,
    ) -> Self {
        Self {
            registry,
            instances,
            session_locks: DashMap::new(),
        }
    }

    async fn handle(&self, message: SyncOutbound) {
        let key = session_key(&message.tenant_id, &message.integration_id, &message.external_id);
        let lock = self
            .session_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let Some(instance) = (self.instances)(&message.tenant_id, &message.integration_id) else {
            warn!(integration_id = %message.integration_id, "no integration instance for write-back");
            return;
        };
        let Some(adapter) = self.registry.get(&instance.provider_id) else {
            warn!(provider_id = %instance.provider_id, "no adapter registered for write-back");
            return;
        };

        let result = match message.operation {
            OutboundOperation::Create => adapter.create_record(&instance, message.payload).await.map(|_| ()),
            OutboundOperation::Update => adapter
                .update_record(&instance, &message.external_id, message.payload)
                .await
                .map(|_| ()),
            OutboundOperation::Delete => adapter.delete_record(&instance, &message.external_id).await,
        };

        if let Err(e) = result {
            warn!(external_id = %message.external_id, error = %e, "write-back failed");
        }
    }

    pub async fn run(self: Arc<Self>, bus: Arc<QueueBus>) {
        while let Some(message) = bus.sync_outbound.consume().await {
            self.handle(message).await;
        }
    }
}
