use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Completion, CompletionProvider};
use crate::errors::ApiError;

const MAX_ANSWER_TOKENS: u32 = 512;

/// OpenAI chat-completions backend. Temperature is pinned to 0.0 so answers
/// for the same prompt stay as stable as the API allows.
pub struct OpenAiCompletion {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageResponse>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct UsageResponse {
    total_tokens: u32,
}

impl OpenAiCompletion {
    pub fn new(model: &str, api_key: &str) -> Self {
        Self {
            model: model.to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<Completion, ApiError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
            max_tokens: MAX_ANSWER_TOKENS,
        };

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Completion(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Completion(format!(
                "OpenAI completions API returned {}: {}",
                status, body
            )));
        }

        let response: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Completion(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Completion {
            text,
            total_tokens: response.usage.map(|u| u.total_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_pins_temperature_to_zero() {
        let req = ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Question: ?".to_string(),
            }],
            temperature: 0.0,
            max_tokens: MAX_ANSWER_TOKENS,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn response_deserializes_with_usage() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": " answer "}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 7, "completion_tokens": 3, "total_tokens": 10}
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some(" answer "));
        assert_eq!(resp.usage.unwrap().total_tokens, 10);
    }

    #[test]
    fn response_tolerates_missing_usage() {
        let json = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(resp.usage.is_none());
    }
}
