use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::ingest::SavedFile;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct SavedUpload {
    pub field: String,
    pub filename: String,
    pub path: String,
    pub content_type: Option<String>,
}

/// POST /api/documents — save uploaded files and schedule ingestion.
///
/// The response carries the saved file list; chunking and embedding happen
/// in a detached task so the upload never waits on embedding cost.
pub async fn upload_documents(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Received document upload request");

    let media_root = state.settings.media_root.clone();
    tokio::fs::create_dir_all(&media_root)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save files: {}", e)))?;

    let mut saved = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("file").to_string();
        let filename = field
            .file_name()
            .map(sanitize_filename)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("file-{}", Uuid::new_v4().simple()));
        let content_type = field.content_type().map(|ct| ct.to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let dest = media_root.join(&filename);
        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to save files: {}", e)))?;

        saved.push(SavedUpload {
            field: field_name,
            filename,
            path: dest.display().to_string(),
            content_type,
        });
    }
    tracing::info!("Saved {} files", saved.len());

    let files: Vec<SavedFile> = saved
        .iter()
        .map(|s| SavedFile {
            filename: s.filename.clone(),
            path: s.path.clone().into(),
        })
        .collect();

    // Deferred ingestion; its failures are logged here and never surface to
    // the uploader, who already has their response.
    let ingestor = Arc::clone(&state.ingestor);
    let count = files.len();
    tokio::spawn(async move {
        match ingestor.ingest_files(&files).await {
            Ok(report) => {
                tracing::info!("Background ingestion inserted {} points", report.inserted);
            }
            Err(err) => {
                tracing::error!("Background ingestion failed: {}", err);
            }
        }
    });
    tracing::info!("Scheduled ingestion for {} files", count);

    Ok(Json(json!({ "status": "ok", "saved": saved })))
}

/// Keeps only the final path component of a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}
