use std::sync::Arc;

use thiserror::Error;

use crate::ask::AskPipeline;
use crate::cache::{AnswerCache, RedisCache};
use crate::completion::OpenAiCompletion;
use crate::config::Settings;
use crate::embedding::{Embedder, EmbeddingService, OpenAiEmbedder};
use crate::errors::ApiError;
use crate::history::SqliteHistory;
use crate::ingest::Ingestor;
use crate::vector::QdrantStore;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("failed to initialize history store: {0}")]
    History(ApiError),
    #[error("failed to prepare media root: {0}")]
    Media(std::io::Error),
}

/// Long-lived handles shared across all routes and background tasks.
///
/// Everything here is created once at process start; the pipelines hold
/// cloned client handles, so no per-request construction happens.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub ask: Arc<AskPipeline>,
    pub ingestor: Arc<Ingestor>,
    pub history: SqliteHistory,
}

impl AppState {
    pub async fn initialize(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        tokio::fs::create_dir_all(&settings.media_root)
            .await
            .map_err(InitializationError::Media)?;

        let history = SqliteHistory::new(&settings.history_db_path)
            .await
            .map_err(InitializationError::History)?;

        // An unreachable cache degrades the service to cacheless operation
        // rather than refusing to start.
        let cache: Option<Arc<dyn AnswerCache>> = match &settings.redis_url {
            Some(url) => match RedisCache::connect(url).await {
                Ok(cache) => Some(Arc::new(cache)),
                Err(err) => {
                    tracing::warn!("Redis unavailable, caching disabled: {}", err);
                    None
                }
            },
            None => {
                tracing::info!("No REDIS_URL configured, caching disabled");
                None
            }
        };

        let vectors = Arc::new(QdrantStore::new(
            &settings.qdrant_url,
            settings.qdrant_api_key.clone(),
        ));

        let remote_embedder: Option<Arc<dyn Embedder>> =
            settings.openai_api_key.as_ref().map(|key| {
                Arc::new(OpenAiEmbedder::new(
                    &settings.embedding_model,
                    key,
                    settings.embedding_dimensions,
                )) as Arc<dyn Embedder>
            });
        let embedder = Arc::new(EmbeddingService::new(remote_embedder));

        let completion = Arc::new(OpenAiCompletion::new(
            &settings.chat_model,
            settings.openai_api_key.as_deref().unwrap_or_default(),
        ));

        let ask = Arc::new(AskPipeline::new(
            cache,
            embedder.clone(),
            vectors.clone(),
            completion,
            Arc::new(history.clone()),
            &settings.cache_prefix,
            settings.cache_ttl_seconds,
        ));

        let ingestor = Arc::new(Ingestor::new(
            vectors,
            embedder,
            &settings.default_collection,
            settings.chunk_size,
            settings.chunk_overlap,
        ));

        Ok(Arc::new(AppState {
            settings,
            ask,
            ingestor,
            history,
        }))
    }
}
