use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use strum::{Display, EnumString};
use uuid::Uuid;

/// A tracked remote repository, unique by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: Uuid,
    pub url: String,
    pub local_path: String,
    pub branch: String,
    /// Unset until the first scan observes a revision.
    pub last_revision: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl RepositoryRecord {
    /// Human-facing name used in notifications.
    pub fn name(&self) -> String {
        utils::repo_name_from_url(&self.url)
    }
}

/// Upsert payload for a repository registration.
#[derive(Debug, Clone)]
pub struct NewRepository {
    pub url: String,
    pub local_path: String,
    pub branch: String
}

/// Append-only record of an observed revision change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub previous_revision: Option<String>,
    pub new_revision: String,
    /// Cleaned message of the commit at the new revision.
    pub summary: Option<String>,
    pub detected_at: DateTime<Utc>
}

impl ChangeEvent {
    pub fn new(
        repository_id: Uuid,
        previous_revision: Option<String>,
        new_revision: String,
        summary: Option<String>
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            repository_id,
            previous_revision,
            new_revision,
            summary,
            detected_at: Utc::now()
        }
    }
}

/// One function discovered in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub file: PathBuf,
    /// 1-based.
    pub start_line: usize,
    pub end_line: usize,
    pub has_documentation: bool,
    pub source: String
}

/// Notification channels known to the dispatcher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString,
    Display
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Chat,
    Email
}

/// Per-channel delivery outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationResult(BTreeMap<String, bool>);

impl NotificationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, channel: impl Into<String>, delivered: bool) {
        self.0.insert(channel.into(), delivered);
    }

    pub fn get(&self, channel: &str) -> Option<bool> {
        self.0.get(channel).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn all_delivered(&self) -> bool {
        self.0.values().all(|delivered| *delivered)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A drafted docstring for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftedDoc {
    pub function: String,
    pub line: usize,
    /// SHA-256 of the function source the draft was generated from.
    pub source_hash: String,
    pub docstring: String
}

/// Drafted documentation for one file, unique per (repository, path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    pub repository_id: Uuid,
    pub path: String,
    pub drafts: Vec<DraftedDoc>,
    pub updated_at: DateTime<Utc>
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_channel_parses_known_names_only() {
        assert_eq!(Channel::from_str("chat").unwrap(), Channel::Chat);
        assert_eq!(Channel::from_str("email").unwrap(), Channel::Email);
        assert!(Channel::from_str("bogus").is_err());
        assert_eq!(Channel::Email.to_string(), "email");
    }

    #[test]
    fn test_notification_result_tracks_every_channel() {
        let mut result = NotificationResult::new();
        result.record("chat", true);
        result.record("bogus", false);
        assert_eq!(result.len(), 2);
        assert_eq!(result.get("bogus"), Some(false));
        assert!(!result.all_delivered());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"bogus": false, "chat": true})
        );
    }

    #[test]
    fn test_repository_record_name() {
        let now = Utc::now();
        let record = RepositoryRecord {
            id: Uuid::new_v4(),
            url: "https://example.com/org/widget.git".to_string(),
            local_path: "/tmp/widget_abc123".to_string(),
            branch: "main".to_string(),
            last_revision: None,
            created_at: now,
            updated_at: now
        };
        assert_eq!(record.name(), "widget");
    }
}
