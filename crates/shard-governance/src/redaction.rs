use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shard_core::RedactionMark;

pub const PROTECTED_PLACEHOLDER: &str = "[REDACTED]";

/// One tenant's redaction policy: a set of dot-paths into `structured_data`
/// that must be replaced before a shard is persisted or returned from
/// retrieval. Generalizes the term-list text redactor to structured
/// field-path redaction, the way the spec's governance overlay requires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactionPolicy {
    pub version: u32,
    pub redacted_paths: Vec<String>,
}

impl RedactionPolicy {
    pub fn empty() -> Self {
        Self {
            version: 0,
            redacted_paths: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.redacted_paths.is_empty()
    }

    /// Applies the policy to a structured document in place, returning the
    /// marks to attach to `Shard::metadata.redactions`.
    pub fn apply(&self, data: &mut Value) -> Vec<RedactionMark> {
        let mut marks = Vec::new();
        for path in &self.redacted_paths {
            if set_if_present(data, path, Value::String(PROTECTED_PLACEHOLDER.to_string())) {
                marks.push(RedactionMark {
                    path: path.clone(),
                    policy_version: self.version,
                });
            }
        }
        marks
    }
}

fn set_if_present(root: &mut Value, path: &str, replacement: Value) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let Some(map) = current.as_object_mut() else {
            return false;
        };
        if i == segments.len() - 1 {
            return match map.get_mut(*segment) {
                Some(slot) => {
                    *slot = replacement;
                    true
                }
                None => false,
            };
        }
        match map.get_mut(*segment) {
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}

/// Per-tenant registry of redaction policies, mirroring the global-then-
/// project-merge lookup pattern: a tenant default, optionally overridden per
/// project.
#[derive(Default)]
pub struct RedactionRegistry {
    by_tenant: HashMap<String, RedactionPolicy>,
}

impl RedactionRegistry {
    pub fn set_policy(&mut self, tenant_id: impl Into<String>, policy: RedactionPolicy) {
        self.by_tenant.insert(tenant_id.into(), policy);
    }

    pub fn policy_for(&self, tenant_id: &str) -> RedactionPolicy {
        self.by_tenant
            .get(tenant_id)
            .cloned()
            .unwrap_or_else(RedactionPolicy::empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_policy_leaves_data_unchanged() {
        let policy = RedactionPolicy::empty();
        let mut data = json!({"ssn": "123-45-6789"});
        let marks = policy.apply(&mut data);
        assert!(marks.is_empty());
        assert_eq!(data["ssn"], "123-45-6789");
    }

    #[test]
    fn redacts_configured_path() {
        let policy = RedactionPolicy {
            version: 1,
            redacted_paths: vec!["ssn".to_string()],
        };
        let mut data = json!({"ssn": "123-45-6789", "name": "Jane"});
        let marks = policy.apply(&mut data);
        assert_eq!(marks.len(), 1);
        assert_eq!(data["ssn"], PROTECTED_PLACEHOLDER);
        assert_eq!(data["name"], "Jane");
    }

    #[test]
    fn missing_path_produces_no_mark() {
        let policy = RedactionPolicy {
            version: 1,
            redacted_paths: vec!["nonexistent.path".to_string()],
        };
        let mut data = json!({"ssn": "123-45-6789"});
        assert!(policy.apply(&mut data).is_empty());
    }
}
