use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use shard_core::Shard;
use shard_store::{Backend, ChangeEvent};
use uuid::Uuid;

use crate::error::RetrievalError;

const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
pub struct ResolveParams {
    pub max_depth: u32,
    pub min_confidence: f32,
    pub max_shards: usize,
}

impl Default for ResolveParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_confidence: 0.3,
            max_shards: 200,
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    inserted_at: Instant,
    shard_ids: Vec<Uuid>,
}

/// BFS over the internal-relationship graph, bounded by depth/confidence/
/// shard-count, with a 5-minute result cache invalidated by the change feed
/// touching any cached shard.
pub struct ProjectResolver {
    store: Arc<dyn Backend>,
    cache: DashMap<(String, String, u32, String, usize), CacheEntry>,
}

impl ProjectResolver {
    pub fn new(store: Arc<dyn Backend>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
        }
    }

    fn cache_key(tenant_id: &str, project_id: &str, params: &ResolveParams) -> (String, String, u32, String, usize) {
        (
            tenant_id.to_string(),
            project_id.to_string(),
            params.max_depth,
            format!("{:.3}", params.min_confidence),
            params.max_shards,
        )
    }

    pub async fn resolve(
        &self,
        tenant_id: &str,
        seed_shard_ids: &[Uuid],
        project_id: &str,
        params: ResolveParams,
    ) -> Result<Vec<Shard>, RetrievalError> {
        let key = Self::cache_key(tenant_id, project_id, &params);
        if let Some(entry) = self.cache.get(&key) {
            if entry.inserted_at.elapsed() < CACHE_TTL {
                let mut out = Vec::with_capacity(entry.shard_ids.len());
                for id in &entry.shard_ids {
                    out.push(self.store.get_shard(tenant_id, *id).await?);
                }
                return Ok(out);
            }
        }

        let mut visited: HashSet<Uuid> = HashSet::new();
        let mut queue: VecDeque<(Uuid, u32)> = seed_shard_ids.iter().map(|id| (*id, 0)).collect();
        let mut result = Vec::new();

        for id in seed_shard_ids {
            visited.insert(*id);
        }

        while let Some((shard_id, depth)) = queue.pop_front() {
            if result.len() >= params.max_shards {
                break;
            }
            if let Ok(shard) = self.store.get_shard(tenant_id, shard_id).await {
                result.push(shard);
            }
            if depth >= params.max_depth {
                continue;
            }
            let edges = self.store.relationships_from(tenant_id, shard_id).await?;
            for edge in edges {
                if edge.confidence < params.min_confidence {
                    continue;
                }
                if visited.insert(edge.to_shard_id) {
                    queue.push_back((edge.to_shard_id, depth + 1));
                }
            }
        }

        self.cache.insert(
            key,
            CacheEntry {
                inserted_at: Instant::now(),
                shard_ids: result.iter().map(|s| s.shard_id).collect(),
            },
        );

        Ok(result)
    }

    /// Invalidates any cache entry whose result set includes the changed
    /// shard. Called from the change-feed consumer loop.
    pub fn invalidate_on_change(&self, event: &ChangeEvent) {
        let shard_id = match event {
            ChangeEvent::ShardCreated { shard_id, .. }
            | ChangeEvent::ShardUpdated { shard_id, .. }
            | ChangeEvent::ShardSoftDeleted { shard_id, .. } => *shard_id,
        };
        self.cache.retain(|_, entry| !entry.shard_ids.contains(&shard_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shard_store::{ChangeFeed, SledStore};

    #[tokio::test]
    async fn bfs_stops_at_max_depth() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ChangeFeed::new());
        let store: Arc<dyn Backend> = Arc::new(SledStore::open(dir.path().to_str().unwrap(), feed).unwrap());

        let a = make_shard("tenant-a");
        let b = make_shard("tenant-a");
        let c = make_shard("tenant-a");
        for s in [&a, &b, &c] {
            store.put_shard(s.clone()).await.unwrap();
        }
        store
            .put_relationship(make_edge("tenant-a", a.shard_id, b.shard_id, 0.9))
            .await
            .unwrap();
        store
            .put_relationship(make_edge("tenant-a", b.shard_id, c.shard_id, 0.9))
            .await
            .unwrap();

        let resolver = ProjectResolver::new(store);
        let result = resolver
            .resolve(
                "tenant-a",
                &[a.shard_id],
                "proj-1",
                ResolveParams {
                    max_depth: 1,
                    min_confidence: 0.0,
                    max_shards: 100,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 2); // a and b, not c
    }

    fn make_shard(tenant_id: &str) -> Shard {
        use chrono::Utc;
        use shard_core::{ShardMetadata, ShardStatus};
        Shard {
            shard_id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            shard_type: "crm.contact".to_string(),
            version: 1,
            status: ShardStatus::Active,
            project_id: None,
            structured_data: serde_json::json!({}),
            searchable_text: String::new(),
            embedding: None,
            source_provider_id: None,
            source_integration_id: None,
            source_external_id: None,
            provenance: vec![],
            metadata: ShardMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn make_edge(
        tenant_id: &str,
        from: Uuid,
        to: Uuid,
        confidence: f32,
    ) -> shard_core::InternalRelationship {
        shard_core::InternalRelationship {
            relationship_id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            from_shard_id: from,
            to_shard_id: to,
            relationship_type: "mentions".to_string(),
            confidence,
            source: shard_core::RelationshipSource::Auto,
            created_at: chrono::Utc::now(),
        }
    }
}
