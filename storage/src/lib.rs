//! # Storage Layer
//!
//! Persistence (SQLite, in-memory) and working-copy tracking for the
//! documentation service.

pub mod git;
pub mod memory;
pub mod mock_vcs;
pub mod repo_tracker;
pub mod sqlite;

pub use git::GitBackend;
pub use memory::InMemoryStore;
pub use mock_vcs::MockVcs;
pub use repo_tracker::{DEFAULT_BRANCH, RepositoryTracker};
pub use sqlite::SqliteStore;
