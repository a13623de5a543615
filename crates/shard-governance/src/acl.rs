use shard_core::Shard;

/// The set of ACL grants a requester carries. A shard with an empty
/// `metadata.acl` is visible to anyone in the tenant; a non-empty list means
/// the requester must hold at least one of the listed grants.
pub struct RequesterGrants<'a> {
    pub grants: &'a [String],
}

pub fn is_visible(shard: &Shard, requester: &RequesterGrants) -> bool {
    if shard.metadata.acl.is_empty() {
        return true;
    }
    shard
        .metadata
        .acl
        .iter()
        .any(|required| requester.grants.iter().any(|g| g == required))
}

/// The spec's provenance requirement: certain derived shard types must carry
/// at least one provenance edge to be eligible for RAG use. The default set
/// covers computed insights; tenants may extend it via policy.
#[derive(Debug, Clone)]
pub struct GovernancePolicy {
    pub provenance_required_for: Vec<String>,
}

impl Default for GovernancePolicy {
    fn default() -> Self {
        Self {
            provenance_required_for: vec!["c_insight_kpi".to_string()],
        }
    }
}

impl GovernancePolicy {
    pub fn usable_in_rag(&self, shard: &Shard) -> bool {
        if self.provenance_required_for.contains(&shard.shard_type) {
            !shard.provenance.is_empty()
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shard_core::{ShardMetadata, ShardStatus};
    use uuid::Uuid;

    fn shard_with_acl(acl: Vec<String>) -> Shard {
        Shard {
            shard_id: Uuid::new_v4(),
            tenant_id: "t1".into(),
            shard_type: "crm.contact".into(),
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
            metadata: ShardMetadata {
                redactions: vec![],
                acl,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn empty_acl_is_visible_to_everyone() {
        let shard = shard_with_acl(vec![]);
        let requester = RequesterGrants { grants: &[] };
        assert!(is_visible(&shard, &requester));
    }

    #[test]
    fn restricted_acl_requires_matching_grant() {
        let shard = shard_with_acl(vec!["finance.read".to_string()]);
        let no_grant = RequesterGrants { grants: &[] };
        let with_grant = RequesterGrants {
            grants: &["finance.read".to_string()],
        };
        assert!(!is_visible(&shard, &no_grant));
        assert!(is_visible(&shard, &with_grant));
    }

    #[test]
    fn insight_shard_without_provenance_is_blocked() {
        let mut shard = shard_with_acl(vec![]);
        shard.shard_type = "c_insight_kpi".to_string();
        let policy = GovernancePolicy::default();
        assert!(!policy.usable_in_rag(&shard));
        shard.provenance.push(Uuid::new_v4());
        assert!(policy.usable_in_rag(&shard));
    }
}
