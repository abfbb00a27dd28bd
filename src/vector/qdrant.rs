use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{SearchHit, VectorPoint, VectorStore};
use crate::errors::ApiError;

/// Qdrant gateway over the REST API.
#[derive(Clone)]
pub struct QdrantStore {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct CollectionInfoResponse {
    result: CollectionInfo,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Deserialize)]
struct VectorParams {
    size: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    id: serde_json::Value,
    score: f32,
    #[serde(default)]
    payload: serde_json::Value,
}

impl QdrantStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimensions: usize,
    ) -> Result<(), ApiError> {
        let url = format!("{}/collections/{}", self.base_url, collection);
        let res = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ApiError::Search(e.to_string()))?;

        match res.status() {
            StatusCode::OK => {
                let info: CollectionInfoResponse = res
                    .json()
                    .await
                    .map_err(|e| ApiError::Search(e.to_string()))?;
                let existing = info.result.config.params.vectors.size;
                if existing != dimensions {
                    return Err(ApiError::Search(format!(
                        "collection '{}' has dimension {} but {} was requested",
                        collection, existing, dimensions
                    )));
                }
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                let body = json!({
                    "vectors": { "size": dimensions, "distance": "Cosine" }
                });
                let res = self
                    .authed(self.client.put(&url))
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| ApiError::Search(e.to_string()))?;
                if !res.status().is_success() {
                    let status = res.status();
                    let text = res.text().await.unwrap_or_default();
                    return Err(ApiError::Search(format!(
                        "failed to create collection '{}' ({}): {}",
                        collection, status, text
                    )));
                }
                tracing::info!("Created collection '{}' (dim={})", collection, dimensions);
                Ok(())
            }
            status => {
                let text = res.text().await.unwrap_or_default();
                Err(ApiError::Search(format!(
                    "collection lookup for '{}' failed ({}): {}",
                    collection, status, text
                )))
            }
        }
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), ApiError> {
        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, collection
        );
        let body = json!({ "points": points });
        let res = self
            .authed(self.client.put(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Search(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Search(format!(
                "upsert into '{}' failed ({}): {}",
                collection, status, text
            )));
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, ApiError> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, collection
        );
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });
        let res = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Search(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Search(format!(
                "search in '{}' failed ({}): {}",
                collection, status, text
            )));
        }

        let response: SearchResponse = res
            .json()
            .await
            .map_err(|e| ApiError::Search(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .map(|hit| SearchHit {
                // Qdrant ids may be integers or uuid strings.
                id: match hit.id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
                score: hit.score,
                payload: hit.payload,
            })
            .collect())
    }
}
