//! Text embedding: remote OpenAI backend with a deterministic fallback.

mod openai;

pub use openai::OpenAiEmbedder;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ApiError;

/// Dimension of the deterministic fallback vector.
pub const FALLBACK_DIMENSIONS: usize = 384;

/// Maps text to a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;

    fn dimensions(&self) -> usize;
}

/// Length-based stand-in vector used when no embedding backend is available.
///
/// Every component is `len(text) / 100.0`, so equal-length texts collide.
/// Good enough to keep ingestion and retrieval flowing in degraded mode.
pub fn fallback_embedding(text: &str) -> Vec<f32> {
    let v = text.chars().count() as f32 / 100.0;
    vec![v; FALLBACK_DIMENSIONS]
}

/// Embedding strategy selector.
///
/// Uses the remote backend when one is configured and silently degrades to
/// the deterministic fallback when the remote call fails. Both the ask path
/// and the ingestion path go through this, so the fallback policy is uniform.
pub struct EmbeddingService {
    remote: Option<Arc<dyn Embedder>>,
}

impl EmbeddingService {
    pub fn new(remote: Option<Arc<dyn Embedder>>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        if let Some(remote) = &self.remote {
            match remote.embed(text).await {
                Ok(vector) => return Ok(vector),
                Err(err) => {
                    tracing::warn!("Remote embedding failed, using fallback: {}", err);
                }
            }
        }
        Ok(fallback_embedding(text))
    }

    fn dimensions(&self) -> usize {
        self.remote
            .as_ref()
            .map(|r| r.dimensions())
            .unwrap_or(FALLBACK_DIMENSIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            Err(ApiError::Embedding("backend down".to_string()))
        }

        fn dimensions(&self) -> usize {
            FALLBACK_DIMENSIONS
        }
    }

    #[test]
    fn fallback_vector_is_length_based() {
        let vector = fallback_embedding("a".repeat(250).as_str());
        assert_eq!(vector.len(), FALLBACK_DIMENSIONS);
        assert!(vector.iter().all(|&v| (v - 2.5).abs() < f32::EPSILON));
    }

    #[test]
    fn fallback_vector_for_empty_text_is_zero() {
        let vector = fallback_embedding("");
        assert!(vector.iter().all(|&v| v == 0.0));
    }

    #[tokio::test]
    async fn service_without_remote_uses_fallback() {
        let service = EmbeddingService::new(None);
        let vector = service.embed("hello").await.unwrap();
        assert_eq!(vector, fallback_embedding("hello"));
    }

    #[tokio::test]
    async fn service_falls_back_when_remote_fails() {
        let service = EmbeddingService::new(Some(Arc::new(FailingEmbedder)));
        let vector = service.embed("hello world").await.unwrap();
        assert_eq!(vector, fallback_embedding("hello world"));
    }
}
