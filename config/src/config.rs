//! # Configuration Structures
//!
//! All configuration structures use `serde` and `validator`. Defaults live
//! next to the structures; the loader only overrides them.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use validator::Validate;

/// Top-level configuration aggregating every subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,

    #[validate(nested)]
    pub llm: LlmConfig,

    #[validate(nested)]
    pub storage: StorageConfig,

    #[validate(nested)]
    pub chat: ChatConfig,

    #[validate(nested)]
    pub email: EmailConfig,

    #[validate(nested)]
    pub scan: ScanConfig
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServerConfig {
    #[validate(length(min = 1, max = 64))]
    pub app_name: String,

    #[validate(length(min = 1, max = 255))]
    pub bind_address: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u16
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_address, self.port).parse()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "Scribe".to_string(),
            bind_address: "0.0.0.0".to_string(),
            port: 8000
        }
    }
}

/// Language-model collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct LlmConfig {
    #[validate(length(min = 1))]
    pub api_key: String,

    #[validate(length(min = 1, max = 128))]
    pub model: String,

    #[validate(url)]
    pub base_url: String,

    /// Sampling temperature for drafting requests.
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32
}

impl LlmConfig {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;
}

/// Persistent store and working-copy locations.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct StorageConfig {
    #[validate(length(min = 1))]
    pub database_url: String,

    pub clone_path: PathBuf
}

/// Chat (Slack Web API) transport. Unconfigured when either the token or the
/// channel is absent.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ChatConfig {
    pub bot_token: Option<String>,

    pub channel_id: Option<String>,

    #[validate(url)]
    pub api_url: String
}

impl ChatConfig {
    pub const DEFAULT_API_URL: &'static str = "https://slack.com/api";

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.channel_id.is_some()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            api_url: Self::DEFAULT_API_URL.to_string()
        }
    }
}

/// SMTP transport.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct EmailConfig {
    #[validate(length(min = 1, max = 255))]
    pub smtp_host: String,

    #[validate(range(min = 1, max = 65535))]
    pub smtp_port: u16,

    pub username: Option<String>,

    pub password: Option<String>,

    #[validate(length(min = 3))]
    pub from_addr: String,

    #[validate(length(min = 3))]
    pub to_addr: String
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            username: None,
            password: None,
            from_addr: "scribe@localhost".to_string(),
            to_addr: "developers@localhost".to_string()
        }
    }
}

/// Scan pipeline limits.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ScanConfig {
    /// Upper bound on language-model calls made by one scan.
    #[validate(range(min = 1, max = 1000))]
    pub max_drafts_per_scan: usize
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_drafts_per_scan: 20
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_socket_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_chat_requires_token_and_channel() {
        let mut chat = ChatConfig::default();
        assert!(!chat.is_configured());
        chat.bot_token = Some("xoxb-1".to_string());
        assert!(!chat.is_configured());
        chat.channel_id = Some("C123".to_string());
        assert!(chat.is_configured());
    }

    #[test]
    fn test_scan_config_rejects_zero_budget() {
        let scan = ScanConfig {
            max_drafts_per_scan: 0
        };
        assert!(scan.validate().is_err());
        assert!(ScanConfig::default().validate().is_ok());
    }
}
