use async_trait::async_trait;
use errors::DrafterError;
use scribe_core::ChatModel;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

const DEFAULT_KEY: &str = "DEFAULT";

/// Chat model returning canned completions keyed by the user message.
#[derive(Default)]
pub struct MockChatModel {
    responses: RwLock<HashMap<String, String>>,
    failing: bool,
    calls: AtomicUsize
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model whose every call fails with a 500.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_default(response: &str) -> Self {
        let mut responses = HashMap::new();
        responses.insert(DEFAULT_KEY.to_string(), response.to_string());
        Self {
            responses: RwLock::new(responses),
            ..Self::default()
        }
    }

    pub async fn add_response(&self, prompt: &str, response: &str) {
        let mut responses = self.responses.write().await;
        responses.insert(prompt.to_string(), response.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, DrafterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(DrafterError::ApiError {
                status: 500,
                body: "mock failure".to_string()
            });
        }

        let responses = self.responses.read().await;
        if let Some(response) = responses.get(user) {
            Ok(response.clone())
        } else if let Some(response) = responses.get(DEFAULT_KEY) {
            Ok(response.clone())
        } else {
            Ok(format!("\"\"\"Mock docstring for {} bytes of source.\"\"\"", user.len()))
        }
    }
}
