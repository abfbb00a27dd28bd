//! Vector store gateway.
//!
//! A narrow contract over the vector database: idempotent collection
//! creation, batched point upserts, and similarity search. The production
//! implementation talks to Qdrant over its REST API.

mod qdrant;

pub use qdrant::QdrantStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;

/// A point ready for upsert: caller-generated unique id, fixed-length
/// embedding, and a JSON payload carrying `{filename, chunk_index, text}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// One ranked search hit with its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub payload: Value,
}

impl SearchHit {
    /// Display text for prompt assembly: `text`, then `content`, then empty.
    pub fn text(&self) -> String {
        self.payload
            .get("text")
            .or_else(|| self.payload.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Source identifier: `filename`, then `source`, then the raw point id.
    pub fn source(&self) -> String {
        self.payload
            .get("filename")
            .or_else(|| self.payload.get("source"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Abstract vector store collaborator.
///
/// Collections are namespaces with a fixed dimension and cosine distance.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates `collection` with the given dimension if it does not exist.
    /// Errors when the collection exists with a different dimension; it
    /// never drops existing data.
    async fn ensure_collection(&self, collection: &str, dimensions: usize)
        -> Result<(), ApiError>;

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), ApiError>;

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hit_text_prefers_text_over_content() {
        let hit = SearchHit {
            id: "1".to_string(),
            score: 0.9,
            payload: json!({"text": "primary", "content": "secondary"}),
        };
        assert_eq!(hit.text(), "primary");
    }

    #[test]
    fn hit_text_falls_back_to_content_then_empty() {
        let hit = SearchHit {
            id: "1".to_string(),
            score: 0.9,
            payload: json!({"content": "secondary"}),
        };
        assert_eq!(hit.text(), "secondary");

        let bare = SearchHit {
            id: "1".to_string(),
            score: 0.9,
            payload: json!({}),
        };
        assert_eq!(bare.text(), "");
    }

    #[test]
    fn hit_source_falls_back_to_point_id() {
        let hit = SearchHit {
            id: "abc123".to_string(),
            score: 0.5,
            payload: json!({}),
        };
        assert_eq!(hit.source(), "abc123");

        let named = SearchHit {
            id: "abc123".to_string(),
            score: 0.5,
            payload: json!({"filename": "doc.txt"}),
        };
        assert_eq!(named.source(), "doc.txt");
    }
}
