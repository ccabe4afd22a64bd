use async_trait::async_trait;
use errors::TransportError;

pub const DEFAULT_EMAIL_SUBJECT: &str = "Scribe Notification";

/// Per-channel options for one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Chat channel to post to instead of the configured one.
    pub chat_channel: Option<String>,
    pub email_subject: Option<String>,
    /// Recipient to mail instead of the configured one.
    pub email_to: Option<String>
}

impl DispatchOptions {
    pub fn with_subject(subject: impl Into<String>) -> Self {
        Self {
            email_subject: Some(subject.into()),
            ..Self::default()
        }
    }

    pub fn subject(&self) -> &str {
        self.email_subject.as_deref().unwrap_or(DEFAULT_EMAIL_SUBJECT)
    }
}

/// One delivery mechanism behind a notification channel.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &str, options: &DispatchOptions) -> Result<(), TransportError>;
}
