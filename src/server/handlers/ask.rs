use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::ask::{AskInput, AskResponse};
use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub query_vector: Option<Vec<f32>>,
    #[serde(default = "default_collection")]
    pub collection_name: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_collection() -> String {
    "default".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_use_cache() -> bool {
    true
}

/// Folds the two mutually exclusive request fields into the tagged pipeline
/// input. Rejected before any external call.
fn into_input(req: &AskRequest) -> Result<AskInput, ApiError> {
    match (&req.question, &req.query_vector) {
        (Some(question), None) if !question.trim().is_empty() => {
            Ok(AskInput::Text(question.clone()))
        }
        (Some(_), None) => Err(ApiError::BadRequest(
            "question must not be empty".to_string(),
        )),
        (None, Some(vector)) if !vector.is_empty() => Ok(AskInput::Vector(vector.clone())),
        (None, Some(_)) => Err(ApiError::BadRequest(
            "query_vector must not be empty".to_string(),
        )),
        (Some(_), Some(_)) => Err(ApiError::BadRequest(
            "supply either question or query_vector, not both".to_string(),
        )),
        (None, None) => Err(ApiError::BadRequest(
            "either question or query_vector is required".to_string(),
        )),
    }
}

/// POST /api/ask — answer a question from the indexed documents.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let input = into_input(&req)?;

    if req.top_k == 0 {
        return Err(ApiError::BadRequest("top_k must be positive".to_string()));
    }

    let response = state
        .ask
        .ask(input, &req.collection_name, req.top_k, req.use_cache)
        .await?;
    Ok(Json(response))
}
