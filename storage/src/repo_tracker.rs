//! Registers remote repositories, keeps their working copies current and
//! records a change event whenever the tip revision moves.

use errors::TrackerError;
use scribe_core::{
    ChangeEvent, NewRepository, RepositoryRecord, RepositoryStore, VcsBackend
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utils::{clean_commit_message, short_revision, unique_checkout_dir_name};
use uuid::Uuid;

pub const DEFAULT_BRANCH: &str = "main";

pub struct RepositoryTracker {
    store: Arc<dyn RepositoryStore>,
    vcs: Arc<dyn VcsBackend>,
    clone_root: PathBuf
}

impl RepositoryTracker {
    pub fn new(
        store: Arc<dyn RepositoryStore>,
        vcs: Arc<dyn VcsBackend>,
        clone_root: impl Into<PathBuf>
    ) -> Self {
        Self {
            store,
            vcs,
            clone_root: clone_root.into()
        }
    }

    pub fn store(&self) -> &Arc<dyn RepositoryStore> {
        &self.store
    }

    /// Register `url` on `branch` (default `main`) and return its identity.
    ///
    /// A record already tracking the same branch with a working copy on disk
    /// is pulled in place. Anything else, including a working copy whose
    /// upstream history was rewritten, gets a fresh clone under the clone
    /// root, and the record is repointed at it.
    #[instrument(skip(self))]
    pub async fn register_or_refresh(
        &self,
        url: &str,
        branch: Option<&str>
    ) -> Result<Uuid, TrackerError> {
        let branch = branch.unwrap_or(DEFAULT_BRANCH).to_string();
        let existing = self.store.get_repository_by_url(url).await?;

        let pulled = match &existing {
            Some(record)
                if record.branch == branch && Path::new(&record.local_path).exists() =>
            {
                debug!("Pulling existing working copy at {}", record.local_path);
                self.pull_or_diverged(record).await?
            }
            _ => false
        };

        let record = match existing {
            Some(record) if pulled => record,
            other => {
                let previous = other.map(|record| record.local_path);
                self.reclone(url, &branch, previous).await?
            }
        };

        info!(id = %record.id, "Registered repository {}", record.url);
        Ok(record.id)
    }

    /// Pull the stored working copy of `id`. Returns `None` for unknown ids.
    ///
    /// When the upstream branch no longer fast-forwards, the working copy is
    /// replaced by a fresh clone and the repointed record is returned.
    #[instrument(skip(self))]
    pub async fn refresh(&self, id: Uuid) -> Result<Option<RepositoryRecord>, TrackerError> {
        let Some(record) = self.store.get_repository(id).await? else {
            return Ok(None);
        };

        if self.pull_or_diverged(&record).await? {
            return Ok(Some(record));
        }

        let previous = Some(record.local_path.clone());
        let record = self.reclone(&record.url, &record.branch, previous).await?;
        Ok(Some(record))
    }

    /// Short form of the working copy's HEAD revision.
    pub async fn current_revision(&self, local_path: &Path) -> Result<String, TrackerError> {
        let path = local_path.to_path_buf();
        let head = self.blocking(move |vcs| vcs.head_commit(&path)).await?;
        Ok(short_revision(&head.id))
    }

    /// Compare the working copy's revision with the stored one.
    ///
    /// On a difference the new revision is persisted and the appended change
    /// event is returned. Unknown ids and unchanged revisions yield `None`.
    #[instrument(skip(self))]
    pub async fn scan(&self, id: Uuid) -> Result<Option<ChangeEvent>, TrackerError> {
        let Some(record) = self.store.get_repository(id).await? else {
            debug!("Scan requested for unknown repository");
            return Ok(None);
        };

        let path = PathBuf::from(&record.local_path);
        let head = self.blocking(move |vcs| vcs.head_commit(&path)).await?;
        let revision = short_revision(&head.id);

        if record.last_revision.as_deref() == Some(revision.as_str()) {
            debug!(%revision, "No new commits");
            return Ok(None);
        }

        let summary = clean_commit_message(&head.message);
        let event = ChangeEvent::new(
            id,
            record.last_revision.clone(),
            revision.clone(),
            (!summary.is_empty()).then_some(summary)
        );

        self.store.update_last_revision(id, &revision).await?;
        self.store.append_change(&event).await?;

        info!(
            previous = ?record.last_revision,
            %revision,
            "Detected new revision for {}",
            record.url
        );
        Ok(Some(event))
    }

    /// Paths touched between the event's previous and new revisions.
    pub async fn changed_files(
        &self,
        record: &RepositoryRecord,
        event: &ChangeEvent
    ) -> Result<Vec<String>, TrackerError> {
        let Some(previous) = event.previous_revision.clone() else {
            return Ok(Vec::new());
        };

        let path = PathBuf::from(&record.local_path);
        let current = event.new_revision.clone();
        self.blocking(move |vcs| vcs.changed_files(&path, &previous, &current))
            .await
    }

    /// Fast-forward the working copy of `record`.
    ///
    /// Returns `false` when the upstream history diverged and the copy must
    /// be re-cloned. Every other failure is propagated.
    async fn pull_or_diverged(&self, record: &RepositoryRecord) -> Result<bool, TrackerError> {
        let path = PathBuf::from(&record.local_path);
        let branch = record.branch.clone();
        match self.blocking(move |vcs| vcs.pull(&path, &branch)).await {
            Ok(()) => Ok(true),
            Err(TrackerError::Diverged { branch }) => {
                warn!(%branch, "Upstream history diverged, re-cloning {}", record.url);
                Ok(false)
            }
            Err(e) => Err(e)
        }
    }

    /// Clone `url` into a new directory, repoint the record at it and drop
    /// the `previous` working copy.
    async fn reclone(
        &self,
        url: &str,
        branch: &str,
        previous: Option<String>
    ) -> Result<RepositoryRecord, TrackerError> {
        std::fs::create_dir_all(&self.clone_root).map_err(|e| TrackerError::Io {
            path: self.clone_root.display().to_string(),
            reason: e.to_string()
        })?;

        let dest = self.clone_root.join(unique_checkout_dir_name(url));
        let (clone_url, clone_branch, clone_dest) =
            (url.to_string(), branch.to_string(), dest.clone());
        self.blocking(move |vcs| vcs.clone_branch(&clone_url, &clone_branch, &clone_dest))
            .await?;

        let record = self
            .store
            .upsert_repository(NewRepository {
                url: url.to_string(),
                local_path: dest.display().to_string(),
                branch: branch.to_string()
            })
            .await?;

        if let Some(previous) = previous.filter(|p| *p != record.local_path) {
            remove_stale_checkout(Path::new(&previous));
        }
        Ok(record)
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, TrackerError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn VcsBackend) -> Result<T, TrackerError> + Send + 'static
    {
        let vcs = Arc::clone(&self.vcs);
        tokio::task::spawn_blocking(move || op(vcs.as_ref()))
            .await
            .map_err(|e| TrackerError::GitError {
                operation: "blocking task".to_string(),
                reason: e.to_string()
            })?
    }
}

/// Best-effort removal of a working copy the record no longer points at.
fn remove_stale_checkout(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) => debug!("Removed stale working copy at {}", path.display()),
        Err(e) => warn!("Failed to remove stale working copy at {}: {}", path.display(), e)
    }
}
