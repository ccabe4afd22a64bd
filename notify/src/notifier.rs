//! Lifecycle notifications built on the dispatcher.

use scribe_core::NotificationResult;
use tracing::instrument;

use crate::dispatcher::Dispatcher;
use crate::transport::DispatchOptions;

const MAX_LISTED_FILES: usize = 5;
const CHAT: &[&str] = &["chat"];
const CHAT_AND_EMAIL: &[&str] = &["chat", "email"];

#[derive(Clone)]
pub struct Notifier {
    dispatcher: Dispatcher
}

impl Notifier {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    #[instrument(skip(self))]
    pub async fn repository_registered(&self, url: &str) -> NotificationResult {
        let message = format!("New repository registered for documentation monitoring: {url}");
        self.dispatcher
            .dispatch(
                &message,
                CHAT,
                &DispatchOptions::with_subject("New Repository Added - Scribe")
            )
            .await
    }

    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn doc_update_needed(&self, repo_name: &str, files: &[String]) -> NotificationResult {
        let message = format!(
            "Documentation update needed for **{repo_name}**\n\n\
             Files that may need documentation updates:\n{}\n\n\
             Please review and update documentation as needed.",
            file_list(files)
        );
        self.dispatcher
            .dispatch(
                &message,
                CHAT_AND_EMAIL,
                &DispatchOptions::with_subject(format!("Documentation Update Needed - {repo_name}"))
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn scan_completed(
        &self,
        repo_name: &str,
        missing: usize,
        generated: usize
    ) -> NotificationResult {
        let status = if missing > 0 {
            "Attention needed"
        } else {
            "All good!"
        };
        let message = format!(
            "Repository scan completed for **{repo_name}**\n\n\
             Results:\n\
             - Missing documentation items: {missing}\n\
             - Auto-generated documentation: {generated}\n\
             - Status: {status}"
        );
        self.dispatcher
            .dispatch(
                &message,
                CHAT,
                &DispatchOptions::with_subject(format!("Scan Complete - {repo_name}"))
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn error_alert(&self, message: &str, repo_name: Option<&str>) -> NotificationResult {
        let context = repo_name.map(|name| format!(" for {name}")).unwrap_or_default();
        let message = format!("Scribe error{context}: {message}");
        self.dispatcher
            .dispatch(
                &message,
                CHAT_AND_EMAIL,
                &DispatchOptions::with_subject("Scribe Error Alert")
            )
            .await
    }
}

fn file_list(files: &[String]) -> String {
    let mut lines: Vec<String> = files
        .iter()
        .take(MAX_LISTED_FILES)
        .map(|file| format!("- {file}"))
        .collect();
    if files.len() > MAX_LISTED_FILES {
        lines.push(format!("- ... and {} more files", files.len() - MAX_LISTED_FILES));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use errors::TransportError;
    use scribe_core::Channel;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Capture {
        sent: Mutex<Vec<(String, String)>>
    }

    #[async_trait]
    impl Transport for Capture {
        async fn send(
            &self,
            message: &str,
            options: &DispatchOptions
        ) -> Result<(), TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push((message.to_string(), options.subject().to_string()));
            Ok(())
        }
    }

    fn notifier() -> (Notifier, Arc<Capture>, Arc<Capture>) {
        let chat = Arc::new(Capture::default());
        let email = Arc::new(Capture::default());
        let dispatcher = Dispatcher::new()
            .with_transport(Channel::Chat, chat.clone())
            .with_transport(Channel::Email, email.clone());
        (Notifier::new(dispatcher), chat, email)
    }

    #[test]
    fn test_file_list_truncates_after_five() {
        let files: Vec<String> = (1..=7).map(|i| format!("f{i}.py")).collect();
        let list = file_list(&files);
        assert_eq!(list.lines().count(), 6);
        assert!(list.contains("- f5.py"));
        assert!(!list.contains("f6.py"));
        assert!(list.ends_with("- ... and 2 more files"));

        assert_eq!(file_list(&files[..2]), "- f1.py\n- f2.py");
    }

    #[tokio::test]
    async fn test_repository_registered_goes_to_chat_only() {
        let (notifier, chat, email) = notifier();
        let result = notifier.repository_registered("https://example.com/r.git").await;

        assert_eq!(result.len(), 1);
        assert_eq!(result.get("chat"), Some(true));
        assert!(chat.sent.lock().unwrap()[0].0.contains("https://example.com/r.git"));
        assert!(email.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_doc_update_needed_goes_to_both_channels() {
        let (notifier, chat, email) = notifier();
        let files = vec!["a.py".to_string()];
        let result = notifier.doc_update_needed("repo", &files).await;

        assert_eq!(result.len(), 2);
        assert!(result.all_delivered());
        assert!(chat.sent.lock().unwrap()[0].0.contains("- a.py"));
        assert_eq!(
            email.sent.lock().unwrap()[0].1,
            "Documentation Update Needed - repo"
        );
    }

    #[tokio::test]
    async fn test_scan_completed_reports_counts() {
        let (notifier, chat, _email) = notifier();
        notifier.scan_completed("repo", 3, 2).await;
        notifier.scan_completed("repo", 0, 0).await;

        let sent = chat.sent.lock().unwrap();
        assert!(sent[0].0.contains("Missing documentation items: 3"));
        assert!(sent[0].0.contains("Auto-generated documentation: 2"));
        assert!(sent[0].0.contains("Attention needed"));
        assert!(sent[1].0.contains("All good!"));
    }

    #[tokio::test]
    async fn test_error_alert_includes_repo_context() {
        let (notifier, chat, email) = notifier();
        notifier.error_alert("boom", Some("repo")).await;
        notifier.error_alert("boom", None).await;

        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent[0].0, "Scribe error for repo: boom");
        assert_eq!(sent[1].0, "Scribe error: boom");
        assert_eq!(email.sent.lock().unwrap()[0].1, "Scribe Error Alert");
    }
}
