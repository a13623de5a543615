use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use shard_core::Shard;
use shard_governance::{is_visible, GovernancePolicy, RequesterGrants};
use shard_store::{Backend, ShardQuery};
use tracing::info;

use crate::embedding::EmbeddingProvider;
use crate::error::RetrievalError;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Debug, Clone)]
pub struct ScoredShard {
    pub shard: Shard,
    pub score: f32,
}

pub struct SearchParams<'a> {
    pub tenant_id: &'a str,
    pub project_id: Option<&'a str>,
    pub query: &'a str,
    pub limit: usize,
    pub grants: &'a [String],
}

/// Search engine wrapping a `Backend` + `EmbeddingProvider` pair, applying
/// ACL filtering and the provenance-required-for-RAG policy to every result
/// before it reaches a caller, and emitting a usage metric every 100 calls.
pub struct VectorSearchEngine {
    store: Arc<dyn Backend>,
    embedder: Arc<dyn EmbeddingProvider>,
    policy: GovernancePolicy,
    search_count: AtomicU64,
}

impl VectorSearchEngine {
    pub fn new(store: Arc<dyn Backend>, embedder: Arc<dyn EmbeddingProvider>, policy: GovernancePolicy) -> Self {
        Self {
            store,
            embedder,
            policy,
            search_count: AtomicU64::new(0),
        }
    }

    fn record_search(&self) {
        let count = self.search_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count % 100 == 0 {
            info!(count, "emitting search volume metric");
        }
    }

    fn filter_and_rank(&self, params: &SearchParams, mut scored: Vec<ScoredShard>) -> Vec<ScoredShard> {
        let requester = RequesterGrants { grants: params.grants };
        scored.retain(|s| is_visible(&s.shard, &requester) && self.policy.usable_in_rag(&s.shard));
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(params.limit);
        scored
    }

    pub async fn semantic_search(&self, params: SearchParams<'_>) -> Result<Vec<ScoredShard>, RetrievalError> {
        self.record_search();
        let query_vec = self.embedder.embed(params.query).await?;
        let candidates = self
            .store
            .query_shards(ShardQuery {
                tenant_id: params.tenant_id.to_string(),
                project_id: params.project_id.map(|s| s.to_string()),
                ..Default::default()
            })
            .await?;

        let scored = candidates
            .into_iter()
            .filter_map(|shard| {
                shard.embedding.as_ref().map(|e| ScoredShard {
                    score: cosine_similarity(e, &query_vec),
                    shard,
                })
            })
            .collect();

        Ok(self.filter_and_rank(&params, scored))
    }

    /// Blends vector similarity with a keyword substring bonus so exact-term
    /// matches are not drowned out by embedding noise.
    pub async fn hybrid_search(&self, params: SearchParams<'_>) -> Result<Vec<ScoredShard>, RetrievalError> {
        self.record_search();
        let query_vec = self.embedder.embed(params.query).await?;
        let needle = params.query.to_lowercase();
        let candidates = self
            .store
            .query_shards(ShardQuery {
                tenant_id: params.tenant_id.to_string(),
                project_id: params.project_id.map(|s| s.to_string()),
                ..Default::default()
            })
            .await?;

        let scored = candidates
            .into_iter()
            .map(|shard| {
                let vector_score = shard
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(e, &query_vec))
                    .unwrap_or(0.0);
                let keyword_bonus = if shard.searchable_text.to_lowercase().contains(&needle) {
                    0.25
                } else {
                    0.0
                };
                ScoredShard {
                    score: vector_score + keyword_bonus,
                    shard,
                }
            })
            .collect();

        Ok(self.filter_and_rank(&params, scored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }
}
