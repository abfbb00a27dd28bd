//! Text completion backend used to synthesize answers.

mod openai;

pub use openai::OpenAiCompletion;

use async_trait::async_trait;

use crate::errors::ApiError;

/// Result of one completion call. Token usage is whatever the backend
/// reports; some deployments omit it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub total_tokens: Option<u32>,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, ApiError>;
}
