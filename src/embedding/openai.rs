use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::errors::ApiError;

/// OpenAI embedding backend.
pub struct OpenAiEmbedder {
    model: String,
    api_key: String,
    dimensions: usize,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(model: &str, api_key: &str, dimensions: usize) -> Self {
        Self {
            model: model.to_string(),
            api_key: api_key.to_string(),
            dimensions,
            client: reqwest::Client::new(),
        }
    }
}

/// Pulls the first embedding out of the response and checks its length.
///
/// A model returning a different dimension than the one collections were
/// created with would poison every upsert, so a mismatch is an error here
/// rather than a surprise at the vector store.
fn extract_vector(response: EmbeddingResponse, dimensions: usize) -> Result<Vec<f32>, ApiError> {
    let vector = response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| ApiError::Embedding("no embedding in response".to_string()))?;

    if vector.len() != dimensions {
        return Err(ApiError::Embedding(format!(
            "model returned a {}-dimensional embedding, expected {}",
            vector.len(),
            dimensions
        )));
    }
    Ok(vector)
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: vec![text.to_string()],
        };

        let resp = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Embedding(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Embedding(format!(
                "OpenAI embeddings API returned {}: {}",
                status, body
            )));
        }

        let response: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Embedding(e.to_string()))?;

        extract_vector(response, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
