use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::ApiError;
use crate::history::HistoryRecord;
use crate::state::AppState;

const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// GET /api/history — most recent question/answer records, newest first.
pub async fn recent_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    if query.limit <= 0 {
        return Err(ApiError::BadRequest("limit must be positive".to_string()));
    }
    let records = state
        .history
        .recent(query.limit.min(MAX_HISTORY_LIMIT))
        .await?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_to_twenty() {
        let query: HistoryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 20);
    }

    #[test]
    fn explicit_limit_is_kept() {
        let query: HistoryQuery = serde_json::from_str(r#"{"limit": 5}"#).unwrap();
        assert_eq!(query.limit, 5);
    }
}
