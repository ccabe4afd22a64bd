//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use errors::DrafterError;
use reqwest::Client;
use scribe_core::ChatModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    client: Client
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>
}

impl OpenAiChatModel {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        temperature: f32
    ) -> Result<Self, DrafterError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DrafterError::RequestFailed {
                reason: format!("Failed to create HTTP client: {e}")
            })?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            temperature,
            client
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, DrafterError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system
                },
                ChatMessage {
                    role: "user",
                    content: user
                },
            ],
            temperature: self.temperature
        };

        debug!(model = %self.model, "Sending chat completion request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DrafterError::RequestFailed {
                reason: e.to_string()
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Chat completion failed with status {}", status);
            return Err(DrafterError::ApiError {
                status: status.as_u16(),
                body
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| DrafterError::RequestFailed {
            reason: format!("Invalid completion payload: {e}")
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(DrafterError::EmptyResponse)
    }
}
