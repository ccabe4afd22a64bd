//! Concurrent fan-out of one message to the requested channels.

use futures_util::future::join_all;
use metrics::counter;
use scribe_core::{Channel, NotificationResult};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, warn};

use crate::transport::{DispatchOptions, Transport};

#[derive(Default, Clone)]
pub struct Dispatcher {
    transports: HashMap<Channel, Arc<dyn Transport>>
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_transport(mut self, channel: Channel, transport: Arc<dyn Transport>) -> Self {
        self.transports.insert(channel, transport);
        self
    }

    /// Deliver `message` on every named channel and wait for all of them.
    ///
    /// The result holds one entry per requested name. Unknown names,
    /// unconfigured channels and failed sends all resolve to `false`.
    pub async fn dispatch(
        &self,
        message: &str,
        channels: &[&str],
        options: &DispatchOptions
    ) -> NotificationResult {
        let mut result = NotificationResult::new();
        let mut sends = Vec::new();

        for name in channels {
            let Ok(channel) = Channel::from_str(name) else {
                warn!("Unknown notification channel: {}", name);
                record(&mut result, name, false);
                continue;
            };
            let Some(transport) = self.transports.get(&channel) else {
                warn!("Notification channel {} is not configured", channel);
                record(&mut result, name, false);
                continue;
            };

            let transport = Arc::clone(transport);
            sends.push(async move {
                let delivered = match transport.send(message, options).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!("Notification failed for {}: {}", name, e);
                        false
                    }
                };
                (*name, delivered)
            });
        }

        for (name, delivered) in join_all(sends).await {
            record(&mut result, name, delivered);
        }
        result
    }
}

fn record(result: &mut NotificationResult, channel: &str, delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    counter!(
        "scribe_notifications_total",
        "channel" => channel.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    result.record(channel, delivered);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use errors::TransportError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, DispatchOptions)>>
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(
            &self,
            message: &str,
            options: &DispatchOptions
        ) -> Result<(), TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push((message.to_string(), options.clone()));
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _: &str, _: &DispatchOptions) -> Result<(), TransportError> {
            Err(TransportError::Email {
                reason: "connection refused".to_string()
            })
        }
    }

    #[tokio::test]
    async fn test_one_entry_per_requested_channel() {
        let chat = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new()
            .with_transport(Channel::Chat, chat.clone())
            .with_transport(Channel::Email, Arc::new(FailingTransport));

        let result = dispatcher
            .dispatch("hello", &["chat", "email", "pager"], &DispatchOptions::default())
            .await;

        assert_eq!(result.len(), 3);
        assert_eq!(result.get("chat"), Some(true));
        assert_eq!(result.get("email"), Some(false));
        assert_eq!(result.get("pager"), Some(false));
        assert!(!result.all_delivered());
        assert_eq!(chat.sent.lock().unwrap()[0].0, "hello");
    }

    #[tokio::test]
    async fn test_failing_chat_and_unknown_name_are_both_false() {
        let dispatcher = Dispatcher::new().with_transport(Channel::Chat, Arc::new(FailingTransport));

        let result = dispatcher
            .dispatch("hello", &["chat", "bogus"], &DispatchOptions::default())
            .await;

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("chat"), Some(false));
        assert_eq!(result.get("bogus"), Some(false));
        assert!(!result.all_delivered());
    }

    #[tokio::test]
    async fn test_unconfigured_channel_is_false() {
        let dispatcher = Dispatcher::new();
        let result = dispatcher
            .dispatch("hello", &["chat"], &DispatchOptions::default())
            .await;
        assert_eq!(result.get("chat"), Some(false));
    }

    #[tokio::test]
    async fn test_options_reach_transport() {
        let email = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new().with_transport(Channel::Email, email.clone());
        let options = DispatchOptions {
            email_to: Some("ops@example.com".to_string()),
            ..DispatchOptions::with_subject("Alert")
        };

        let result = dispatcher.dispatch("body", &["email"], &options).await;
        assert!(result.all_delivered());

        let sent = email.sent.lock().unwrap();
        assert_eq!(sent[0].1.subject(), "Alert");
        assert_eq!(sent[0].1.email_to.as_deref(), Some("ops@example.com"));
    }

    #[tokio::test]
    async fn test_no_channels_is_empty_result() {
        let result = Dispatcher::new()
            .dispatch("hello", &[], &DispatchOptions::default())
            .await;
        assert!(result.is_empty());
    }
}
