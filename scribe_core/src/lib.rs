//! # Scribe Core
//!
//! Shared types and collaborator traits for the documentation service.
//!
//! This crate provides:
//! - The persisted records (repositories, change events, drafted docs)
//! - Transient values produced by the pipeline (function descriptors,
//!   notification results)
//! - The seams every external collaborator is reached through, so callers can
//!   inject in-memory fakes

pub mod traits;
pub mod types;

pub use traits::{ChatModel, CommitInfo, RepositoryStore, VcsBackend};
pub use types::{
    Channel, ChangeEvent, DocRecord, DraftedDoc, FunctionDescriptor, NewRepository,
    NotificationResult, RepositoryRecord
};
