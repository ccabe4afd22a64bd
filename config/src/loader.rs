//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles. Empty values count as unset.
//!
//! ## Environment Variables
//! - `SCRIBE_APP_NAME`, `SCRIBE_BIND_ADDRESS` (default "0.0.0.0"),
//!   `SCRIBE_PORT` (default 8000)
//! - `OPENAI_API_KEY` (required), `OPENAI_MODEL` (default "gpt-4o-mini"),
//!   `OPENAI_BASE_URL`, `OPENAI_TEMPERATURE` (default 0.1)
//! - `DATABASE_URL` (required), `DEFAULT_CLONE_PATH` (default "./repos")
//! - `SLACK_BOT_TOKEN`, `SLACK_CHANNEL_ID`, `SLACK_API_URL`
//! - `SMTP_HOST` (default "localhost"), `SMTP_PORT` (default 25),
//!   `SMTP_USER`, `SMTP_PASS`, `FROM_ADDR`, `TO_ADDR`
//! - `SCRIBE_MAX_DRAFTS` (default 20)

use crate::config::{
    ChatConfig, Config, EmailConfig, LlmConfig, ScanConfig, ServerConfig, StorageConfig
};
use errors::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use validator::Validate;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_from_env()
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>
    {
        load_from_lookup(lookup)
    }
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<Config, ConfigError> {
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Load and validate configuration from an arbitrary key lookup.
pub fn load_from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>
{
    let env = Env(lookup);
    let server_defaults = ServerConfig::default();
    let email_defaults = EmailConfig::default();

    let config = Config {
        server: ServerConfig {
            app_name: env.get("SCRIBE_APP_NAME").unwrap_or(server_defaults.app_name),
            bind_address: env
                .get("SCRIBE_BIND_ADDRESS")
                .unwrap_or(server_defaults.bind_address),
            port: env.parse("SCRIBE_PORT", server_defaults.port)?
        },
        llm: LlmConfig {
            api_key: env.required("OPENAI_API_KEY")?,
            model: env
                .get("OPENAI_MODEL")
                .unwrap_or_else(|| LlmConfig::DEFAULT_MODEL.to_string()),
            base_url: env
                .get("OPENAI_BASE_URL")
                .unwrap_or_else(|| LlmConfig::DEFAULT_BASE_URL.to_string()),
            temperature: env.parse("OPENAI_TEMPERATURE", LlmConfig::DEFAULT_TEMPERATURE)?
        },
        storage: StorageConfig {
            database_url: env.required("DATABASE_URL")?,
            clone_path: env
                .get("DEFAULT_CLONE_PATH")
                .map_or_else(|| PathBuf::from("./repos"), PathBuf::from)
        },
        chat: ChatConfig {
            bot_token: env.get("SLACK_BOT_TOKEN"),
            channel_id: env.get("SLACK_CHANNEL_ID"),
            api_url: env
                .get("SLACK_API_URL")
                .unwrap_or_else(|| ChatConfig::DEFAULT_API_URL.to_string())
        },
        email: EmailConfig {
            smtp_host: env.get("SMTP_HOST").unwrap_or(email_defaults.smtp_host),
            smtp_port: env.parse("SMTP_PORT", email_defaults.smtp_port)?,
            username: env.get("SMTP_USER"),
            password: env.get("SMTP_PASS"),
            from_addr: env.get("FROM_ADDR").unwrap_or(email_defaults.from_addr),
            to_addr: env.get("TO_ADDR").unwrap_or(email_defaults.to_addr)
        },
        scan: ScanConfig {
            max_drafts_per_scan: env
                .parse("SCRIBE_MAX_DRAFTS", ScanConfig::default().max_drafts_per_scan)?
        }
    };

    config.validate().map_err(|e| ConfigError::Validation {
        reason: e.to_string()
    })?;

    if !config.chat.is_configured() {
        tracing::info!("Chat transport not configured, chat notifications will be dropped");
    }

    Ok(config)
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::Missing {
            key: key.to_string()
        })
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw
            }),
            None => Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        load_from_lookup(|key| map.get(key).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("OPENAI_API_KEY", "sk-test"),
        ("DATABASE_URL", "sqlite::memory:")
    ];

    #[test]
    fn test_defaults_applied_when_only_secrets_set() {
        let config = load(REQUIRED).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!((config.llm.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.storage.clone_path, PathBuf::from("./repos"));
        assert_eq!(config.email.smtp_port, 25);
        assert_eq!(config.email.to_addr, "developers@localhost");
        assert!(!config.chat.is_configured());
        assert_eq!(config.scan.max_drafts_per_scan, 20);
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = load(&[("DATABASE_URL", "sqlite::memory:")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref key } if key == "OPENAI_API_KEY"));
    }

    #[test]
    fn test_blank_database_url_counts_as_missing() {
        let err = load(&[("OPENAI_API_KEY", "sk"), ("DATABASE_URL", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref key } if key == "DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port_reports_key_and_value() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SCRIBE_PORT", "eighty"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { ref key, ref value } if key == "SCRIBE_PORT" && value == "eighty"
        ));
    }

    #[test]
    fn test_validation_rejects_bad_base_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("OPENAI_BASE_URL", "not a url"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_chat_and_smtp_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("SLACK_BOT_TOKEN", "xoxb-1"),
            ("SLACK_CHANNEL_ID", "C42"),
            ("SMTP_HOST", "mail.internal"),
            ("SMTP_PORT", "2525"),
            ("SMTP_USER", "bot"),
            ("SCRIBE_MAX_DRAFTS", "5")
        ]);
        let config = load(&pairs).unwrap();
        assert!(config.chat.is_configured());
        assert_eq!(config.email.smtp_host, "mail.internal");
        assert_eq!(config.email.smtp_port, 2525);
        assert_eq!(config.email.username.as_deref(), Some("bot"));
        assert_eq!(config.email.password, None);
        assert_eq!(config.scan.max_drafts_per_scan, 5);
    }
}
