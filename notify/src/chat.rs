//! Slack `chat.postMessage` transport.

use async_trait::async_trait;
use config::ChatConfig;
use errors::TransportError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};

use crate::transport::{DispatchOptions, Transport};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SlackTransport {
    client: Client,
    api_url: String,
    bot_token: String,
    channel_id: String
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>
}

impl SlackTransport {
    pub fn new(
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
        channel_id: impl Into<String>
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Chat {
                reason: format!("Failed to create HTTP client: {e}")
            })?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            channel_id: channel_id.into()
        })
    }

    /// Build a transport when both token and channel are configured.
    pub fn from_config(config: &ChatConfig) -> Result<Option<Self>, TransportError> {
        match (&config.bot_token, &config.channel_id) {
            (Some(token), Some(channel)) => {
                Self::new(&config.api_url, token, channel).map(Some)
            }
            _ => Ok(None)
        }
    }
}

#[async_trait]
impl Transport for SlackTransport {
    async fn send(&self, message: &str, options: &DispatchOptions) -> Result<(), TransportError> {
        let channel = options.chat_channel.as_deref().unwrap_or(&self.channel_id);

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_url))
            .bearer_auth(&self.bot_token)
            .json(&json!({ "channel": channel, "text": message }))
            .send()
            .await
            .map_err(|e| TransportError::Chat {
                reason: e.to_string()
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Slack returned status {}", status);
            return Err(TransportError::Chat {
                reason: format!("status {status}")
            });
        }

        let body: PostMessageResponse =
            response.json().await.map_err(|e| TransportError::Chat {
                reason: format!("Invalid response: {e}")
            })?;
        if !body.ok {
            return Err(TransportError::Chat {
                reason: body.error.unwrap_or_else(|| "unknown error".to_string())
            });
        }

        let preview: String = message.chars().take(50).collect();
        info!("Slack notification sent: {}...", preview);
        Ok(())
    }
}
