use regex::Regex;
use shard_core::{InternalRelationship, RelationshipSource};
use uuid::Uuid;

/// Stands in for the LLM-backed entity extractor: given a shard's searchable
/// text, proposes internal relationships to other shards it plausibly
/// mentions. The reference implementation is a heuristic email/@mention
/// matcher; a production deployment swaps in an LLM-backed implementation
/// behind the same trait.
pub trait EntityExtractor: Send + Sync {
    fn extract_mentions(&self, text: &str) -> Vec<String>;
}

pub struct HeuristicEntityExtractor {
    email_pattern: Regex,
}

impl HeuristicEntityExtractor {
    pub fn new() -> Self {
        Self {
            email_pattern: Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap(),
        }
    }
}

impl Default for HeuristicEntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor for HeuristicEntityExtractor {
    fn extract_mentions(&self, text: &str) -> Vec<String> {
        self.email_pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }
}

/// Builds a low-confidence auto-sourced relationship from an extracted
/// mention once the caller has resolved it to a shard id.
pub fn mention_relationship(
    tenant_id: &str,
    from_shard_id: Uuid,
    to_shard_id: Uuid,
) -> InternalRelationship {
    InternalRelationship {
        relationship_id: Uuid::new_v4(),
        tenant_id: tenant_id.to_string(),
        from_shard_id,
        to_shard_id,
        relationship_type: "mentions".to_string(),
        confidence: 0.4,
        source: RelationshipSource::Auto,
        created_at: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_email_mentions() {
        let extractor = HeuristicEntityExtractor::new();
        let mentions = extractor.extract_mentions("cc Jane@Example.com and bob@acme.io please");
        assert_eq!(mentions, vec!["jane@example.com", "bob@acme.io"]);
    }
}
