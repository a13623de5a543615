use async_trait::async_trait;
use shard_core::{InternalRelationship, Shard};
use uuid::Uuid;

use crate::diff::FieldDiff;
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
pub struct ShardQuery {
    pub tenant_id: String,
    pub shard_type: Option<String>,
    pub project_id: Option<String>,
    pub include_soft_deleted: bool,
}

/// Storage contract the rest of the engine codes against. The record store
/// (a partitioned document database with vector-index support and a change
/// feed) is an external collaborator; this trait is the seam, with a
/// Sled-backed reference implementation standing in for it.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn put_shard(&self, shard: Shard) -> Result<(), StoreError>;

    /// Updates an existing shard, bumping its version and returning the
    /// field-level diff against the prior version for audit emission.
    async fn update_shard(&self, shard: Shard) -> Result<Vec<FieldDiff>, StoreError>;

    async fn get_shard(&self, tenant_id: &str, shard_id: Uuid) -> Result<Shard, StoreError>;

    async fn query_shards(&self, query: ShardQuery) -> Result<Vec<Shard>, StoreError>;

    async fn soft_delete_shard(&self, tenant_id: &str, shard_id: Uuid) -> Result<(), StoreError>;

    async fn put_relationship(&self, relationship: InternalRelationship) -> Result<(), StoreError>;

    async fn relationships_from(
        &self,
        tenant_id: &str,
        shard_id: Uuid,
    ) -> Result<Vec<InternalRelationship>, StoreError>;
}
