//! # Configuration System
//!
//! Centralized configuration for the Scribe documentation service.
//!
//! This crate provides:
//! - Configuration structures for every collaborator the service talks to
//! - Environment variable loading (12-factor app principles)
//! - Validation through the `validator` crate
//!
//! Missing secrets fail startup rather than individual requests.

pub mod config;
pub mod loader;

pub use config::{
    ChatConfig, Config, EmailConfig, LlmConfig, ScanConfig, ServerConfig, StorageConfig
};
pub use loader::{load_from_env, load_from_lookup};
pub use validator::Validate;
