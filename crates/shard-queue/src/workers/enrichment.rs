use std::sync::Arc;

use shard_store::{Backend, ShardQuery};
use tracing::warn;

use crate::bus::{EnrichmentJob, QueueBus, ShardEmission};
use crate::entity_extractor::{mention_relationship, EntityExtractor};

/// Consumes `shard-emission`, runs entity extraction over the shard's
/// searchable text, and resolves each mention against already-stored shards
/// in the same tenant to propose low-confidence `mentions` relationships.
/// Forwards an `EnrichmentJob` marker once done so downstream consumers
/// (metrics, insight recompute triggers) can observe completion.
pub struct EnrichmentWorker {
    store: Arc<dyn Backend>,
    extractor: Arc<dyn EntityExtractor>,
}

impl EnrichmentWorker {
    pub fn new(store: Arc<dyn Backend>, extractor: Arc<dyn EntityExtractor>) -> Self {
        Self { store, extractor }
    }

    async fn handle(&self, emission: ShardEmission, bus: &QueueBus) {
        let shard = match self.store.get_shard(&emission.tenant_id, emission.shard_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "enrichment could not load shard");
                return;
            }
        };

        let mentions = self.extractor.extract_mentions(&shard.searchable_text);
        if !mentions.is_empty() {
            let candidates = self
                .store
                .query_shards(ShardQuery {
                    tenant_id: emission.tenant_id.clone(),
                    ..Default::default()
                })
                .await
                .unwrap_or_default();

            for mention in &mentions {
                for candidate in &candidates {
                    if candidate.shard_id == shard.shard_id {
                        continue;
                    }
                    if candidate.searchable_text.to_lowercase().contains(mention.as_str()) {
                        let edge = mention_relationship(&emission.tenant_id, shard.shard_id, candidate.shard_id);
                        if let Err(e) = self.store.put_relationship(edge).await {
                            warn!(error = %e, "failed to persist mention relationship");
                        }
                    }
                }
            }
        }

        let _ = bus
            .enrichment_jobs
            .publish(EnrichmentJob {
                tenant_id: emission.tenant_id,
                shard_id: emission.shard_id,
            })
            .await;
    }

    pub async fn run(self: Arc<Self>, bus: Arc<QueueBus>) {
        while let Some(emission) = bus.shard_emission.consume().await {
            self.handle(emission, &bus).await;
        }
    }
}
