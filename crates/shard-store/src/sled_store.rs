use std::sync::Arc;

use async_trait::async_trait;
use shard_core::{InternalRelationship, Shard, ShardStatus};
use uuid::Uuid;

use crate::backend::{Backend, ShardQuery};
use crate::diff::{diff_structured_data, FieldDiff};
use crate::error::StoreError;
use crate::feed::{ChangeEvent, ChangeFeed};

const TREE_SHARDS: &str = "shards";
const TREE_RELATIONSHIPS: &str = "relationships_internal";

fn shard_key(tenant_id: &str, shard_id: Uuid) -> String {
    format!("{tenant_id}:{shard_id}")
}

/// Sled-backed reference implementation of `Backend`. One Sled instance
/// holds all tenants; each logical collection gets its own tree, the same
/// layout the knowledge store uses for its per-slot trees. Sled is a
/// single-writer store -- only one process may open a given path, so the
/// gateway and worker binaries must each point at their own `store_path`.
pub struct SledStore {
    db: sled::Db,
    feed: Arc<ChangeFeed>,
}

impl SledStore {
    pub fn open(path: &str, feed: Arc<ChangeFeed>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db, feed })
    }

    fn shards_tree(&self) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(TREE_SHARDS)?)
    }

    fn relationships_tree(&self) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(TREE_RELATIONSHIPS)?)
    }
}

#[async_trait]
impl Backend for SledStore {
    async fn put_shard(&self, shard: Shard) -> Result<(), StoreError> {
        let tree = self.shards_tree()?;
        let key = shard_key(&shard.tenant_id, shard.shard_id);
        let bytes = serde_json::to_vec(&shard)?;
        tree.insert(key.as_bytes(), bytes)?;
        self.feed.publish(ChangeEvent::ShardCreated {
            tenant_id: shard.tenant_id.clone(),
            shard_id: shard.shard_id,
        });
        Ok(())
    }

    async fn update_shard(&self, mut shard: Shard) -> Result<Vec<FieldDiff>, StoreError> {
        let tree = self.shards_tree()?;
        let key = shard_key(&shard.tenant_id, shard.shard_id);
        let previous: Option<Shard> = tree
            .get(key.as_bytes())?
            .map(|bytes| serde_json::from_slice(&bytes))
            .transpose()?;

        let diffs = match &previous {
            Some(prev) if prev.tenant_id != shard.tenant_id => {
                return Err(StoreError::TenantMismatch)
            }
            Some(prev) => diff_structured_data(&prev.structured_data, &shard.structured_data),
            None => Vec::new(),
        };

        shard.version = previous.map(|p| p.version + 1).unwrap_or(1);
        let bytes = serde_json::to_vec(&shard)?;
        tree.insert(key.as_bytes(), bytes)?;
        self.feed.publish(ChangeEvent::ShardUpdated {
            tenant_id: shard.tenant_id.clone(),
            shard_id: shard.shard_id,
        });
        Ok(diffs)
    }

    async fn get_shard(&self, tenant_id: &str, shard_id: Uuid) -> Result<Shard, StoreError> {
        let tree = self.shards_tree()?;
        let key = shard_key(tenant_id, shard_id);
        let bytes = tree
            .get(key.as_bytes())?
            .ok_or(StoreError::NotFound(shard_id))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn query_shards(&self, query: ShardQuery) -> Result<Vec<Shard>, StoreError> {
        let tree = self.shards_tree()?;
        let prefix = format!("{}:", query.tenant_id);
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item?;
            let shard: Shard = serde_json::from_slice(&bytes)?;
            if !query.include_soft_deleted && shard.status == ShardStatus::SoftDeleted {
                continue;
            }
            if let Some(t) = &query.shard_type {
                if &shard.shard_type != t {
                    continue;
                }
            }
            if let Some(p) = &query.project_id {
                if shard.project_id.as_deref() != Some(p.as_str()) {
                    continue;
                }
            }
            out.push(shard);
        }
        Ok(out)
    }

    async fn soft_delete_shard(&self, tenant_id: &str, shard_id: Uuid) -> Result<(), StoreError> {
        let mut shard = self.get_shard(tenant_id, shard_id).await?;
        shard.status = ShardStatus::SoftDeleted;
        shard.deleted_at = Some(chrono::Utc::now());
        let tree = self.shards_tree()?;
        let key = shard_key(tenant_id, shard_id);
        tree.insert(key.as_bytes(), serde_json::to_vec(&shard)?)?;
        self.feed.publish(ChangeEvent::ShardSoftDeleted {
            tenant_id: tenant_id.to_string(),
            shard_id,
        });
        Ok(())
    }

    async fn put_relationship(&self, relationship: InternalRelationship) -> Result<(), StoreError> {
        let tree = self.relationships_tree()?;
        let key = format!(
            "{}:{}:{}",
            relationship.tenant_id, relationship.from_shard_id, relationship.relationship_id
        );
        tree.insert(key.as_bytes(), serde_json::to_vec(&relationship)?)?;
        Ok(())
    }

    async fn relationships_from(
        &self,
        tenant_id: &str,
        shard_id: Uuid,
    ) -> Result<Vec<InternalRelationship>, StoreError> {
        let tree = self.relationships_tree()?;
        let prefix = format!("{tenant_id}:{shard_id}:");
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item?;
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(out)
    }
}
