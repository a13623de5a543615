use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShardStatus {
    Active,
    SoftDeleted,
}

/// Canonical record shape stored by `shard-store`. Every object the pipeline
/// ever persists -- a normalized external record, a derived insight, an audit
/// log entry -- is a `Shard`; what it *means* is carried in `shard_type` and
/// `structured_data`, not in a parallel type hierarchy (see design note on
/// modeling variants as data, not inheritance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shard {
    pub shard_id: Uuid,
    pub tenant_id: String,
    pub shard_type: String,
    pub version: u64,
    pub status: ShardStatus,
    pub project_id: Option<String>,
    pub structured_data: serde_json::Value,
    /// Free-text projection used for embedding/full-text search.
    pub searchable_text: String,
    pub embedding: Option<Vec<f32>>,
    pub source_provider_id: Option<String>,
    pub source_integration_id: Option<String>,
    pub source_external_id: Option<String>,
    /// Shard ids this shard was derived from (insight computation, enrichment).
    pub provenance: Vec<Uuid>,
    pub metadata: ShardMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when `status == SoftDeleted`; store/retrieval purges the row after this.
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShardMetadata {
    /// Dot-paths redacted by the governance overlay and the policy version that did it.
    pub redactions: Vec<RedactionMark>,
    pub acl: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionMark {
    pub path: String,
    pub policy_version: u32,
}

impl Shard {
    pub fn ttl_days(&self) -> u32 {
        match self.shard_type.as_str() {
            "system.audit_log" => 90,
            _ => 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(shard_type: &str) -> Shard {
        Shard {
            shard_id: Uuid::nil(),
            tenant_id: "t1".into(),
            shard_type: shard_type.into(),
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

    #[test]
    fn audit_shards_keep_deletions_longer() {
        assert_eq!(sample("system.audit_log").ttl_days(), 90);
        assert_eq!(sample("crm.contact").ttl_days(), 30);
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipSource {
    Manual,
    Auto,
    Adapter,
}

/// Edge between two shards belonging to the same tenant (the project graph BFS
/// walks these). Cyclic references are allowed; traversal bounds depth instead
/// of rejecting cycles structurally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalRelationship {
    pub relationship_id: Uuid,
    pub tenant_id: String,
    pub from_shard_id: Uuid,
    pub to_shard_id: Uuid,
    pub relationship_type: String,
    pub confidence: f32,
    pub source: RelationshipSource,
    pub created_at: DateTime<Utc>,
}

/// Edge from a canonical shard to a foreign-system record it was not converted
/// from (e.g. "mentioned in"), as opposed to the shard's own source-of-record
/// fields (`source_provider_id` etc).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalRelationship {
    pub relationship_id: Uuid,
    pub tenant_id: String,
    pub shard_id: Uuid,
    pub provider_id: String,
    pub external_id: String,
    pub relationship_type: String,
    pub created_at: DateTime<Utc>,
}
