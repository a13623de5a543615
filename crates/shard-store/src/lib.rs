pub mod backend;
pub mod diff;
pub mod error;
pub mod feed;
pub mod sled_store;

pub use backend::{Backend, ShardQuery};
pub use diff::{diff_structured_data, FieldDiff};
pub use error::StoreError;
pub use feed::{ChangeEvent, ChangeFeed};
pub use sled_store::SledStore;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shard_core::{Shard, ShardMetadata, ShardStatus};
    use std::sync::Arc;
    use uuid::Uuid;

    fn sample_shard(tenant_id: &str) -> Shard {
        Shard {
            shard_id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            shard_type: "crm.contact".to_string(),
            version: 0,
            status: ShardStatus::Active,
            project_id: None,
            structured_data: serde_json::json!({"name": "Jane"}),
            searchable_text: "Jane".to_string(),
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

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ChangeFeed::new());
        let store = SledStore::open(dir.path().to_str().unwrap(), feed).unwrap();
        let shard = sample_shard("tenant-a");
        let id = shard.shard_id;
        store.put_shard(shard).await.unwrap();
        let fetched = store.get_shard("tenant-a", id).await.unwrap();
        assert_eq!(fetched.structured_data["name"], "Jane");
    }

    #[tokio::test]
    async fn soft_delete_excluded_from_default_query() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ChangeFeed::new());
        let store = SledStore::open(dir.path().to_str().unwrap(), feed).unwrap();
        let shard = sample_shard("tenant-a");
        let id = shard.shard_id;
        store.put_shard(shard).await.unwrap();
        store.soft_delete_shard("tenant-a", id).await.unwrap();

        let active = store
            .query_shards(ShardQuery {
                tenant_id: "tenant-a".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(active.is_empty());

        let all = store
            .query_shards(ShardQuery {
                tenant_id: "tenant-a".to_string(),
                include_soft_deleted: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn update_returns_field_diff() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ChangeFeed::new());
        let store = SledStore::open(dir.path().to_str().unwrap(), feed).unwrap();
        let mut shard = sample_shard("tenant-a");
        let id = shard.shard_id;
        store.put_shard(shard.clone()).await.unwrap();

        shard.structured_data = serde_json::json!({"name": "Jane Doe"});
        let diffs = store.update_shard(shard).await.unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "name");

        let fetched = store.get_shard("tenant-a", id).await.unwrap();
        assert_eq!(fetched.version, 1);
    }
}
