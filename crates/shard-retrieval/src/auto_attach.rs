use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use serde_json::Value;
use shard_core::{InternalRelationship, RelationshipSource};
use shard_store::{Backend, ChangeEvent, ShardQuery};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RetrievalError;

const PROJECT_SHARD_TYPE: &str = "c_project";
const TIME_OVERLAP_WINDOW_DAYS: i64 = 30;
const EXPLICIT_REFERENCE_CONFIDENCE: f32 = 0.9;
const STRONG_OVERLAP_CONFIDENCE: f32 = 0.7;
const RELATIONSHIP_TYPE: &str = "auto_attached";

/// Watches for newly created shards and auto-attaches them to whatever open
/// projects they overlap strongly with, the same way a user would manually
/// link a record to a project -- except this runs on every `ShardCreated`
/// event instead of waiting for someone to notice the connection.
pub struct AutoAttachWorker {
    store: Arc<dyn Backend>,
}

impl AutoAttachWorker {
    pub fn new(store: Arc<dyn Backend>) -> Self {
        Self { store }
    }

    async fn evaluate(&self, tenant_id: &str, shard_id: Uuid) -> Result<(), RetrievalError> {
        let shard = self.store.get_shard(tenant_id, shard_id).await?;
        if shard.shard_type == PROJECT_SHARD_TYPE {
            return Ok(());
        }

        let projects = self
            .store
            .query_shards(ShardQuery {
                tenant_id: tenant_id.to_string(),
                shard_type: Some(PROJECT_SHARD_TYPE.to_string()),
                ..Default::default()
            })
            .await?;

        let shard_entities = entity_refs(&shard.structured_data);
        let shard_actors = actor_refs(&shard.structured_data);

        for project in &projects {
            if project.shard_id == shard.shard_id {
                continue;
            }

            let explicit = mentions_project(&shard, project);
            let entity_overlap = !shard_entities.is_disjoint(&entity_refs(&project.structured_data));
            let actor_overlap = !shard_actors.is_disjoint(&actor_refs(&project.structured_data));
            let time_overlap = within_window(&shard, project);

            let signal_count = [entity_overlap, actor_overlap, time_overlap]
                .iter()
                .filter(|s| **s)
                .count();

            let strong = explicit || signal_count >= 2;
            if !strong {
                continue;
            }

            let existing = self.store.relationships_from(tenant_id, project.shard_id).await?;
            if existing.iter().any(|edge| edge.to_shard_id == shard.shard_id) {
                continue;
            }

            let confidence = if explicit {
                EXPLICIT_REFERENCE_CONFIDENCE
            } else {
                STRONG_OVERLAP_CONFIDENCE
            };

            self.store
                .put_relationship(InternalRelationship {
                    relationship_id: Uuid::new_v4(),
                    tenant_id: tenant_id.to_string(),
                    from_shard_id: project.shard_id,
                    to_shard_id: shard.shard_id,
                    relationship_type: RELATIONSHIP_TYPE.to_string(),
                    confidence,
                    source: RelationshipSource::Auto,
                    created_at: chrono::Utc::now(),
                })
                .await?;

            info!(
                tenant_id,
                project_id = %project.shard_id,
                shard_id = %shard.shard_id,
                confidence,
                "auto-attached shard to project"
            );
        }

        Ok(())
    }

    /// Consumes the change feed, evaluating overlap rules for every newly
    /// created shard. Updates and soft-deletes never trigger attachment; only
    /// creation does.
    pub async fn run_on_change_feed(self: Arc<Self>, mut events: broadcast::Receiver<ChangeEvent>) {
        loop {
            match events.recv().await {
                Ok(ChangeEvent::ShardCreated { tenant_id, shard_id }) => {
                    if let Err(e) = self.evaluate(&tenant_id, shard_id).await {
                        warn!(tenant_id, %shard_id, error = %e, "auto-attachment evaluation failed");
                    }
                }
                Ok(ChangeEvent::ShardUpdated { .. }) | Ok(ChangeEvent::ShardSoftDeleted { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auto-attachment worker lagged behind change feed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("change feed closed, auto-attachment worker stopping");
                    break;
                }
            }
        }
    }
}

/// Collects values of any key named "id" or ending in "_id" (other than the
/// shard's own identity fields), recursively, as a proxy for "linked
/// entities" -- account ids, ticket ids, document ids, whatever the source
/// record carries.
fn entity_refs(data: &Value) -> HashSet<String> {
    let mut refs = HashSet::new();
    collect_by_key_suffix(data, "_id", &mut refs);
    collect_exact_key(data, "id", &mut refs);
    refs
}

/// Collects values of keys that name a participant: author, user, owner,
/// assignee, or a `participants` array.
fn actor_refs(data: &Value) -> HashSet<String> {
    let mut refs = HashSet::new();
    for key in ["author", "user", "owner", "assignee", "actor"] {
        collect_exact_key_named(data, key, &mut refs);
    }
    if let Some(Value::Array(items)) = data.get("participants") {
        for item in items {
            if let Some(s) = item.as_str() {
                refs.insert(s.to_string());
            }
        }
    }
    refs
}

fn collect_by_key_suffix(data: &Value, suffix: &str, out: &mut HashSet<String>) {
    match data {
        Value::Object(map) => {
            for (key, value) in map {
                if key.ends_with(suffix) {
                    push_scalar(value, out);
                }
                collect_by_key_suffix(value, suffix, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_by_key_suffix(item, suffix, out);
            }
        }
        _ => {}
    }
}

fn collect_exact_key(data: &Value, key: &str, out: &mut HashSet<String>) {
    collect_exact_key_named(data, key, out);
}

fn collect_exact_key_named(data: &Value, key: &str, out: &mut HashSet<String>) {
    match data {
        Value::Object(map) => {
            for (k, value) in map {
                if k == key {
                    push_scalar(value, out);
                }
                collect_exact_key_named(value, key, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_exact_key_named(item, key, out);
            }
        }
        _ => {}
    }
}

fn push_scalar(value: &Value, out: &mut HashSet<String>) {
    match value {
        Value::String(s) => {
            out.insert(s.clone());
        }
        Value::Number(n) => {
            out.insert(n.to_string());
        }
        _ => {}
    }
}

fn within_window(shard: &shard_core::Shard, project: &shard_core::Shard) -> bool {
    let window = ChronoDuration::days(TIME_OVERLAP_WINDOW_DAYS);
    (shard.created_at - project.updated_at).abs() <= window
}

fn mentions_project(shard: &shard_core::Shard, project: &shard_core::Shard) -> bool {
    let haystack = shard.searchable_text.to_lowercase();
    if haystack.contains(&project.shard_id.to_string()) {
        return true;
    }
    if let Some(name) = project.structured_data.get("name").and_then(|v| v.as_str()) {
        if name.len() >= 3 && haystack.contains(&name.to_lowercase()) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shard_core::{Shard, ShardMetadata, ShardStatus};
    use shard_store::SledStore;

    fn shard(tenant_id: &str, shard_type: &str, data: Value, text: &str) -> Shard {
        Shard {
            shard_id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            shard_type: shard_type.to_string(),
            version: 1,
            status: ShardStatus::Active,
            project_id: None,
            structured_data: data,
            searchable_text: text.to_string(),
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
    async fn entity_and_actor_overlap_triggers_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(shard_store::ChangeFeed::new());
        let store: Arc<dyn Backend> = Arc::new(SledStore::open(dir.path().to_str().unwrap(), feed).unwrap());

        let project = shard(
            "tenant-a",
            PROJECT_SHARD_TYPE,
            serde_json::json!({"account_id": "acct-1", "owner": "alice"}),
            "Q3 renewal project",
        );
        store.put_shard(project.clone()).await.unwrap();

        let record = shard(
            "tenant-a",
            "crm.opportunity",
            serde_json::json!({"account_id": "acct-1", "owner": "alice"}),
            "renewal call notes",
        );
        store.put_shard(record.clone()).await.unwrap();

        let worker = AutoAttachWorker::new(store.clone());
        worker.evaluate("tenant-a", record.shard_id).await.unwrap();

        let edges = store.relationships_from("tenant-a", project.shard_id).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to_shard_id, record.shard_id);
        assert_eq!(edges[0].relationship_type, RELATIONSHIP_TYPE);
    }

    #[tokio::test]
    async fn single_weak_signal_does_not_attach() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(shard_store::ChangeFeed::new());
        let store: Arc<dyn Backend> = Arc::new(SledStore::open(dir.path().to_str().unwrap(), feed).unwrap());

        let project = shard(
            "tenant-a",
            PROJECT_SHARD_TYPE,
            serde_json::json!({"account_id": "acct-1"}),
            "Q3 renewal project",
        );
        store.put_shard(project.clone()).await.unwrap();

        let record = shard(
            "tenant-a",
            "crm.opportunity",
            serde_json::json!({"account_id": "acct-1", "owner": "bob"}),
            "unrelated note",
        );
        store.put_shard(record.clone()).await.unwrap();

        let worker = AutoAttachWorker::new(store.clone());
        worker.evaluate("tenant-a", record.shard_id).await.unwrap();

        let edges = store.relationships_from("tenant-a", project.shard_id).await.unwrap();
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn explicit_reference_alone_attaches() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(shard_store::ChangeFeed::new());
        let store: Arc<dyn Backend> = Arc::new(SledStore::open(dir.path().to_str().unwrap(), feed).unwrap());

        let project = shard(
            "tenant-a",
            PROJECT_SHARD_TYPE,
            serde_json::json!({"name": "Acme Renewal"}),
            "",
        );
        store.put_shard(project.clone()).await.unwrap();

        let record = shard(
            "tenant-a",
            "messaging.message",
            serde_json::json!({}),
            "following up on the Acme Renewal thread",
        );
        store.put_shard(record.clone()).await.unwrap();

        let worker = AutoAttachWorker::new(store.clone());
        worker.evaluate("tenant-a", record.shard_id).await.unwrap();

        let edges = store.relationships_from("tenant-a", project.shard_id).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].confidence, EXPLICIT_REFERENCE_CONFIDENCE);
    }
}
