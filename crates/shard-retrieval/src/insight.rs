use std::sync::Arc;

use chrono::Utc;
use shard_core::{Shard, ShardMetadata, ShardStatus};
use shard_store::{Backend, ChangeEvent, ShardQuery};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RetrievalError;

const CRM_CATEGORY_SHARD_TYPES: &[&str] = &["crm.contact", "crm.opportunity", "crm.account"];
const KPI_SHARD_TYPE: &str = "c_insight_kpi";

/// Recomputes KPI shards from the CRM-category shards in a project whenever
/// one changes, and nightly as a full batch. New versions supersede old ones
/// by version number; nothing is deleted, so historical KPI values remain
/// queryable.
pub struct InsightEngine {
    store: Arc<dyn Backend>,
}

impl InsightEngine {
    pub fn new(store: Arc<dyn Backend>) -> Self {
        Self { store }
    }

    async fn recompute_tenant(&self, tenant_id: &str) -> Result<(), RetrievalError> {
        let crm_shards = self
            .store
            .query_shards(ShardQuery {
                tenant_id: tenant_id.to_string(),
                ..Default::default()
            })
            .await?
            .into_iter()
            .filter(|s| CRM_CATEGORY_SHARD_TYPES.contains(&s.shard_type.as_str()))
            .collect::<Vec<_>>();

        if crm_shards.is_empty() {
            return Ok(());
        }

        let open_count = crm_shards
            .iter()
            .filter(|s| s.shard_type == "crm.opportunity")
            .filter(|s| {
                s.structured_data
                    .get("stage")
                    .and_then(|v| v.as_str())
                    .map(|stage| stage != "closed_won" && stage != "closed_lost")
                    .unwrap_or(false)
            })
            .count();

        let kpi = Shard {
            shard_id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            shard_type: KPI_SHARD_TYPE.to_string(),
            version: 1,
            status: ShardStatus::Active,
            project_id: None,
            structured_data: serde_json::json!({ "open_opportunities": open_count }),
            searchable_text: format!("{open_count} open opportunities"),
            embedding: None,
            source_provider_id: None,
            source_integration_id: None,
            source_external_id: None,
            provenance: crm_shards.iter().map(|s| s.shard_id).collect(),
            metadata: ShardMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };

        self.store.put_shard(kpi).await?;
        Ok(())
    }

    /// Consumes the change feed, recomputing a tenant's insights whenever one
    /// of its CRM-category shards changes.
    pub async fn run_on_change_feed(self: Arc<Self>, mut events: broadcast::Receiver<ChangeEvent>) {
        loop {
            match events.recv().await {
                Ok(ChangeEvent::ShardCreated { tenant_id, .. })
                | Ok(ChangeEvent::ShardUpdated { tenant_id, .. }) => {
                    if let Err(e) = self.recompute_tenant(&tenant_id).await {
                        warn!(tenant_id, error = %e, "insight recompute failed");
                    }
                }
                Ok(ChangeEvent::ShardSoftDeleted { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "insight engine lagged behind change feed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("change feed closed, insight engine stopping");
                    break;
                }
            }
        }
    }

    /// Nightly full recompute across every tenant currently holding shards.
    pub async fn nightly_batch(&self, tenant_ids: &[String]) {
        for tenant_id in tenant_ids {
            if let Err(e) = self.recompute_tenant(tenant_id).await {
                warn!(tenant_id, error = %e, "nightly insight recompute failed");
            }
        }
    }
}
