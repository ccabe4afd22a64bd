//! Collaborator seams for the documentation service

use async_trait::async_trait;
use errors::{DrafterError, StoreError, TrackerError};
use std::path::Path;
use uuid::Uuid;

use crate::types::{ChangeEvent, DocRecord, NewRepository, RepositoryRecord};

/// Persistent store for repositories, change events and drafted docs.
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Insert or update the record keyed by URL. An existing record keeps its
    /// identity and takes the new path and branch.
    async fn upsert_repository(&self, repo: NewRepository)
    -> Result<RepositoryRecord, StoreError>;

    async fn get_repository(&self, id: Uuid) -> Result<Option<RepositoryRecord>, StoreError>;

    async fn get_repository_by_url(
        &self,
        url: &str
    ) -> Result<Option<RepositoryRecord>, StoreError>;

    async fn update_last_revision(&self, id: Uuid, revision: &str) -> Result<(), StoreError>;

    async fn append_change(&self, event: &ChangeEvent) -> Result<(), StoreError>;

    /// Change events for a repository in creation order.
    async fn list_changes(&self, repository_id: Uuid) -> Result<Vec<ChangeEvent>, StoreError>;

    /// Insert or replace the doc record keyed by (repository, path).
    async fn upsert_doc(&self, doc: &DocRecord) -> Result<(), StoreError>;

    async fn list_docs(&self, repository_id: Uuid) -> Result<Vec<DocRecord>, StoreError>;
}

/// Tip commit of a working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub message: String
}

/// Version-control operations on local working copies.
///
/// Implementations block; async callers run them on the blocking pool.
pub trait VcsBackend: Send + Sync {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<(), TrackerError>;

    /// Fetch `branch` from origin and fast-forward the working copy.
    fn pull(&self, path: &Path, branch: &str) -> Result<(), TrackerError>;

    fn head_commit(&self, path: &Path) -> Result<CommitInfo, TrackerError>;

    /// Paths changed between two revisions of the working copy.
    fn changed_files(&self, path: &Path, from: &str, to: &str)
    -> Result<Vec<String>, TrackerError>;
}

/// Chat-completion language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, DrafterError>;
}
