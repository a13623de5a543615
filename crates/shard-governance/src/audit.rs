use chrono::Utc;
use shard_core::{AuditRecord, Shard, ShardMetadata, ShardStatus};
use uuid::Uuid;

use crate::redaction::RedactionPolicy;

/// Audit records are shards like any other (`system.audit_log`), so ACL
/// filtering and query-by-tenant fall out of the shard store for free. Their
/// before/after payloads go through the same redaction hook as any other
/// structured data before being persisted.
pub fn audit_record_to_shard(mut record: AuditRecord, policy: &RedactionPolicy) -> Shard {
    let mut structured_data = serde_json::json!({
        "actor": record.actor,
        "action": record.action,
        "target_shard_id": record.target_shard_id,
        "before": record.before.take(),
        "after": record.after.take(),
    });
    let redactions = policy.apply(&mut structured_data);

    Shard {
        shard_id: record.audit_id,
        tenant_id: record.tenant_id,
        shard_type: "system.audit_log".to_string(),
        version: 1,
        status: ShardStatus::Active,
        project_id: None,
        searchable_text: format!("{} {}", record.action, record.actor),
        structured_data,
        embedding: None,
        source_provider_id: None,
        source_integration_id: None,
        source_external_id: None,
        provenance: record.target_shard_id.into_iter().collect(),
        metadata: ShardMetadata {
            redactions,
            acl: vec!["governance.audit.read".to_string()],
        },
        created_at: record.occurred_at,
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

pub fn new_audit_record(
    tenant_id: impl Into<String>,
    actor: impl Into<String>,
    action: impl Into<String>,
    target_shard_id: Option<Uuid>,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
) -> AuditRecord {
    AuditRecord {
        audit_id: Uuid::new_v4(),
        tenant_id: tenant_id.into(),
        actor: actor.into(),
        action: action.into(),
        target_shard_id,
        before,
        after,
        occurred_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_audit_payload_same_as_any_shard() {
        let record = new_audit_record(
            "tenant-a",
            "user-1",
            "shard.update",
            None,
            Some(serde_json::json!({"ssn": "123-45-6789"})),
            Some(serde_json::json!({"ssn": "987-65-4321"})),
        );
        let policy = RedactionPolicy {
            version: 1,
            redacted_paths: vec!["before.ssn".to_string(), "after.ssn".to_string()],
        };
        let shard = audit_record_to_shard(record, &policy);
        assert_eq!(shard.structured_data["before"]["ssn"], "[REDACTED]");
        assert_eq!(shard.structured_data["after"]["ssn"], "[REDACTED]");
        assert_eq!(shard.metadata.redactions.len(), 2);
    }
}
