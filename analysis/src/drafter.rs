//! Drafts docstrings for undocumented functions.

use errors::DrafterError;
use scribe_core::ChatModel;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Instruction sent with every drafting request.
pub const SYSTEM_PROMPT: &str = "You are a senior Python engineer. Write a concise Google-style \
docstring for the function you are given. Describe its purpose, arguments, return value and \
raised exceptions where relevant. Respond with the docstring only, placed inside triple double \
quotes, without repeating the function.";

pub struct Drafter {
    model: Arc<dyn ChatModel>
}

impl Drafter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Ask the model for a docstring for `function_source`.
    ///
    /// The reply is trimmed, stripped of surrounding `"` characters and
    /// trimmed again, so a triple-quoted answer comes back as bare text.
    #[instrument(skip_all, fields(source_len = function_source.len()))]
    pub async fn draft(&self, function_source: &str) -> Result<String, DrafterError> {
        let raw = self.model.complete(SYSTEM_PROMPT, function_source).await?;
        let cleaned = clean_completion(&raw);
        debug!(chars = cleaned.len(), "Drafted docstring");
        Ok(cleaned)
    }
}

fn clean_completion(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}
