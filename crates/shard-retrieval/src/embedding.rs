use async_trait::async_trait;

use crate::error::RetrievalError;

/// Stands in for the embedding model the way a vector-store trait stands in
/// for a managed vector database: the rest of the engine codes against this
/// trait, and a graceful fallback keeps the system usable without a live
/// embedding service.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
    fn dimensions(&self) -> usize;
}

/// Deterministic hash-based embedder for tests and environments with no
/// configured embedding model. Not semantically meaningful, but stable and
/// dependency-free, so retrieval logic is exercisable without network calls.
pub struct HashEmbeddingProvider {
    dims: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut vector = vec![0f32; self.dims];
        for (i, byte) in text.bytes().enumerate() {
            let slot = i % self.dims;
            vector[slot] += (byte as f32 / 255.0) - 0.5;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let provider = HashEmbeddingProvider::new(16);
        let a = provider.embed("hello world").await.unwrap();
        let b = provider.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }
}
