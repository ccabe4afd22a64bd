//! In-process version control for tests.
//!
//! Remotes are keyed by URL and hold a linear commit history per branch.
//! Checkouts are real directories so callers can check `Path::exists`.

use errors::TrackerError;
use parking_lot::Mutex;
use scribe_core::{CommitInfo, VcsBackend};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use utils::compute_content_hash;

#[derive(Debug, Clone)]
struct MockCommit {
    id: String,
    message: String,
    files: Vec<String>
}

#[derive(Debug, Clone)]
struct Checkout {
    url: String,
    branch: String,
    position: usize
}

#[derive(Default)]
struct State {
    remotes: HashMap<String, HashMap<String, Vec<MockCommit>>>,
    checkouts: HashMap<PathBuf, Checkout>
}

#[derive(Default)]
pub struct MockVcs {
    state: Mutex<State>
}

impl MockVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit to `branch` of the remote at `url` and return its id.
    pub fn add_commit(&self, url: &str, branch: &str, message: &str, files: &[&str]) -> String {
        let mut state = self.state.lock();
        let history = state
            .remotes
            .entry(url.to_string())
            .or_default()
            .entry(branch.to_string())
            .or_default();

        let id = compute_content_hash(&format!("{url}:{branch}:{}:{message}", history.len()));
        history.push(MockCommit {
            id: id.clone(),
            message: message.to_string(),
            files: files.iter().map(|f| (*f).to_string()).collect()
        });
        id
    }

    fn checkout(state: &State, path: &Path) -> Result<Checkout, TrackerError> {
        state
            .checkouts
            .get(path)
            .cloned()
            .ok_or_else(|| TrackerError::InvalidWorkingCopy {
                path: path.display().to_string(),
                reason: "no checkout at path".to_string()
            })
    }

    fn history<'a>(state: &'a State, checkout: &Checkout) -> &'a [MockCommit] {
        state
            .remotes
            .get(&checkout.url)
            .and_then(|branches| branches.get(&checkout.branch))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl VcsBackend for MockVcs {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<(), TrackerError> {
        let mut state = self.state.lock();

        let history = state
            .remotes
            .get(url)
            .ok_or_else(|| TrackerError::CloneFailed {
                url: url.to_string(),
                reason: "repository not found".to_string()
            })?
            .get(branch)
            .filter(|commits| !commits.is_empty())
            .ok_or_else(|| TrackerError::CloneFailed {
                url: url.to_string(),
                reason: format!("remote branch {branch} not found")
            })?;
        let position = history.len() - 1;

        std::fs::create_dir_all(dest).map_err(|e| TrackerError::Io {
            path: dest.display().to_string(),
            reason: e.to_string()
        })?;

        state.checkouts.insert(
            dest.to_path_buf(),
            Checkout {
                url: url.to_string(),
                branch: branch.to_string(),
                position
            }
        );
        Ok(())
    }

    fn pull(&self, path: &Path, branch: &str) -> Result<(), TrackerError> {
        let mut state = self.state.lock();
        let mut checkout = Self::checkout(&state, path)?;
        checkout.branch = branch.to_string();

        let len = Self::history(&state, &checkout).len();
        if len == 0 {
            return Err(TrackerError::FetchFailed {
                branch: branch.to_string(),
                reason: "remote branch not found".to_string()
            });
        }
        checkout.position = len - 1;
        state.checkouts.insert(path.to_path_buf(), checkout);
        Ok(())
    }

    fn head_commit(&self, path: &Path) -> Result<CommitInfo, TrackerError> {
        let state = self.state.lock();
        let checkout = Self::checkout(&state, path)?;
        let commit = Self::history(&state, &checkout)
            .get(checkout.position)
            .ok_or_else(|| TrackerError::GitError {
                operation: "resolve HEAD".to_string(),
                reason: "checkout points past history".to_string()
            })?;

        Ok(CommitInfo {
            id: commit.id.clone(),
            message: commit.message.clone()
        })
    }

    fn changed_files(
        &self,
        path: &Path,
        from: &str,
        to: &str
    ) -> Result<Vec<String>, TrackerError> {
        let state = self.state.lock();
        let checkout = Self::checkout(&state, path)?;
        let history = Self::history(&state, &checkout);

        let index_of = |rev: &str| {
            history
                .iter()
                .position(|c| c.id == rev || c.id.starts_with(rev))
                .ok_or_else(|| TrackerError::GitError {
                    operation: format!("resolve {rev}"),
                    reason: "unknown revision".to_string()
                })
        };
        let start = index_of(from)?;
        let end = index_of(to)?;

        let files: BTreeSet<String> = history
            .iter()
            .take(end + 1)
            .skip(start + 1)
            .flat_map(|c| c.files.iter().cloned())
            .collect();
        Ok(files.into_iter().collect())
    }
}
