//! The ask pipeline: cache lookup, embedding, vector search, prompt
//! assembly, completion, cache write and deferred history persistence.
//!
//! Within one request the stages run strictly in order. Cache and history
//! failures degrade the request (logged only); embedding, search and
//! completion failures abort it with a stage-identifying error.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cache::{cache_key, AnswerCache, CachedAnswer};
use crate::completion::CompletionProvider;
use crate::embedding::Embedder;
use crate::errors::ApiError;
use crate::history::HistorySink;
use crate::vector::VectorStore;

/// Query input for one ask request. Exactly one of question text or a
/// precomputed query vector is supplied; the "neither" state cannot be
/// constructed.
#[derive(Debug, Clone)]
pub enum AskInput {
    Text(String),
    /// Caller-supplied embedding. Skips the cache (keys derive from question
    /// text) and the embed stage; the prompt carries an empty question line.
    Vector(Vec<f32>),
}

impl AskInput {
    fn question(&self) -> &str {
        match self {
            AskInput::Text(q) => q,
            AskInput::Vector(_) => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub tokens: Option<u32>,
    pub time_ms: f64,
}

impl From<CachedAnswer> for AskResponse {
    fn from(bundle: CachedAnswer) -> Self {
        AskResponse {
            answer: bundle.answer,
            sources: bundle.sources,
            tokens: bundle.tokens,
            time_ms: bundle.time_ms,
        }
    }
}

/// Builds the completion prompt: fixed instruction preamble, retrieved
/// passages numbered in retrieval order, then the question and an answer cue.
pub fn build_prompt(question: &str, contexts: &[String]) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant. Use only the following sources to answer the question. \
         If the answer is not found, say you don't know.\n\n",
    );
    for (i, context) in contexts.iter().enumerate() {
        prompt.push_str(&format!("Source {}:\n{}\n\n", i + 1, context));
    }
    prompt.push_str(&format!("Question: {}\nAnswer:", question));
    prompt
}

pub struct AskPipeline {
    cache: Option<Arc<dyn AnswerCache>>,
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorStore>,
    completion: Arc<dyn CompletionProvider>,
    history: Arc<dyn HistorySink>,
    cache_prefix: String,
    cache_ttl_seconds: u64,
}

impl AskPipeline {
    pub fn new(
        cache: Option<Arc<dyn AnswerCache>>,
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorStore>,
        completion: Arc<dyn CompletionProvider>,
        history: Arc<dyn HistorySink>,
        cache_prefix: &str,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            cache,
            embedder,
            vectors,
            completion,
            history,
            cache_prefix: cache_prefix.to_string(),
            cache_ttl_seconds,
        }
    }

    pub async fn ask(
        &self,
        input: AskInput,
        collection: &str,
        top_k: usize,
        use_cache: bool,
    ) -> Result<AskResponse, ApiError> {
        let started = Instant::now();

        // CACHE_CHECK. Only question text can be keyed.
        let key = match (&input, use_cache, &self.cache) {
            (AskInput::Text(question), true, Some(_)) => {
                Some(cache_key(&self.cache_prefix, collection, question))
            }
            _ => None,
        };

        if let (Some(key), Some(cache)) = (&key, &self.cache) {
            match cache.get(key).await {
                Ok(Some(raw)) => match serde_json::from_str::<CachedAnswer>(&raw) {
                    Ok(bundle) => {
                        tracing::info!("Cache hit for key={}", key);
                        return Ok(bundle.into());
                    }
                    Err(err) => {
                        // Corrupted entry: drop it and recompute.
                        tracing::warn!("Discarding unparseable cache entry {}: {}", key, err);
                        if let Err(err) = cache.delete(key).await {
                            tracing::warn!("Failed to delete cache entry {}: {}", key, err);
                        }
                    }
                },
                Ok(None) => {
                    tracing::debug!("Cache miss for key={}", key);
                }
                Err(err) => {
                    tracing::warn!("Cache get failed for key={}: {}", key, err);
                }
            }
        }

        // EMBED.
        let query_vector = match &input {
            AskInput::Text(question) => self.embedder.embed(question).await?,
            AskInput::Vector(vector) => vector.clone(),
        };

        // SEARCH.
        let hits = self.vectors.search(collection, &query_vector, top_k).await?;
        tracing::info!("Search returned {} hits in '{}'", hits.len(), collection);

        let contexts: Vec<String> = hits.iter().map(|h| h.text()).collect();
        let sources: Vec<String> = hits.iter().map(|h| h.source()).collect();

        // COMPOSE + COMPLETE.
        let prompt = build_prompt(input.question(), &contexts);
        let completion = self.completion.complete(&prompt).await?;

        let time_ms = started.elapsed().as_secs_f64() * 1000.0;

        // CACHE_WRITE. Failure is logged only.
        if let (Some(key), Some(cache)) = (&key, &self.cache) {
            let bundle = CachedAnswer {
                answer: completion.text.clone(),
                sources: sources.clone(),
                tokens: completion.total_tokens,
                time_ms,
            };
            match serde_json::to_string(&bundle) {
                Ok(value) => {
                    if let Err(err) = cache.set_ex(key, &value, self.cache_ttl_seconds).await {
                        tracing::warn!("Failed to cache answer under {}: {}", key, err);
                    }
                }
                Err(err) => {
                    tracing::warn!("Failed to serialize cache bundle for {}: {}", key, err);
                }
            }
        }

        // HISTORY_SCHEDULE. Runs after the response is produced; failures
        // stay inside the spawned task.
        let sink = Arc::clone(&self.history);
        let question = input.question().to_string();
        let answer = completion.text.clone();
        let tokens = completion.total_tokens;
        let history_sources = sources.clone();
        tokio::spawn(async move {
            if let Err(err) = sink
                .persist(&question, &answer, tokens, &history_sources)
                .await
            {
                tracing::warn!("Failed to persist query history: {}", err);
            }
        });

        Ok(AskResponse {
            answer: completion.text,
            sources,
            tokens: completion.total_tokens,
            time_ms,
        })
    }
}
