use super::AnswerService;
use crate::error::{provider_error, AssistantResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// OpenAI-compatible chat completions client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// `base_url` includes the version segment, e.g. `https://api.openai.com/v1`
    pub fn new(client: Client, base_url: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl AnswerService for OpenAiClient {
    async fn complete(&self, query: &str) -> AssistantResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| provider_error("OPENAI_API_KEY is not set"))?;

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": query }],
        });

        debug!("Asking {} a question", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| provider_error(&format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(provider_error(&format!(
                "Chat request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| provider_error(&format!("Malformed chat response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| provider_error("Chat response has no content"))
    }
}
