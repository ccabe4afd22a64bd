//! # Scribe Errors
//!
//! Error taxonomy for the documentation service.
//!
//! - Uses `thiserror` for structured error definitions
//! - Named fields carry the context needed to debug a failure from a log line
//! - Transport failures never escape the notification dispatcher; they are
//!   defined here so adapters share one vocabulary

use thiserror::Error;

/// Working-copy and remote failures raised by the repository tracker
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Clone of {url} failed: {reason}")]
    CloneFailed { url: String, reason: String },

    #[error("Fetch of branch {branch} failed: {reason}")]
    FetchFailed { branch: String, reason: String },

    #[error("Branch {branch} has diverged from its remote, fast-forward impossible")]
    Diverged { branch: String },

    #[error("Not a valid working copy: {path}: {reason}")]
    InvalidWorkingCopy { path: String, reason: String },

    #[error("Git operation: {operation} failed: {reason}")]
    GitError { operation: String, reason: String },

    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError)
}

/// Source-parsing failures raised by the function inventory
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Parser language could not be loaded: {reason}")]
    Language { reason: String }
}

/// Language-model failures raised by the documentation drafter
#[derive(Debug, Error)]
pub enum DrafterError {
    #[error("Request to language model failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Language model returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Language model returned no completion")]
    EmptyResponse
}

/// Persistent store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection to {backend} failed: {reason}")]
    ConnectionError { backend: String, reason: String },

    #[error("Query on {backend} failed: {reason}")]
    QueryError { backend: String, reason: String },

    #[error("Serialization error: {error_type} - {reason}")]
    SerializationError { error_type: String, reason: String }
}

/// Notification transport failures, reduced to a boolean by the dispatcher
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Chat delivery failed: {reason}")]
    Chat { reason: String },

    #[error("Email delivery failed: {reason}")]
    Email { reason: String }
}

/// Startup configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {key}")]
    Missing { key: String },

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },

    #[error("Configuration rejected: {reason}")]
    Validation { reason: String }
}

impl TrackerError {
    /// Whether the failure originated on the remote rather than locally.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::CloneFailed { .. } | Self::FetchFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_error_display_includes_context() {
        let err = TrackerError::CloneFailed {
            url: "https://example.com/repo.git".to_string(),
            reason: "unreachable".to_string()
        };
        assert_eq!(
            err.to_string(),
            "Clone of https://example.com/repo.git failed: unreachable"
        );
        assert!(err.is_remote());
    }

    #[test]
    fn test_store_error_converts_into_tracker_error() {
        let err: TrackerError = StoreError::QueryError {
            backend: "sqlite".to_string(),
            reason: "locked".to_string()
        }
        .into();
        assert!(matches!(err, TrackerError::Store(_)));
        assert!(!err.is_remote());
    }
}
