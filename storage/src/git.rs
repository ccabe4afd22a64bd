//! libgit2-backed working-copy operations.

use errors::TrackerError;
use git2::{BranchType, Repository, build::CheckoutBuilder, build::RepoBuilder};
use scribe_core::{CommitInfo, VcsBackend};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy)]
pub struct GitBackend;

impl GitBackend {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<Repository, TrackerError> {
        Repository::open(path).map_err(|e| TrackerError::InvalidWorkingCopy {
            path: path.display().to_string(),
            reason: e.to_string()
        })
    }
}

impl VcsBackend for GitBackend {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<(), TrackerError> {
        info!("Cloning {} ({}) to {:?}", url, branch, dest);

        let result = RepoBuilder::new().branch(branch).clone(url, dest);
        if let Err(e) = result {
            if dest.exists() {
                let _ = std::fs::remove_dir_all(dest);
            }
            return Err(TrackerError::CloneFailed {
                url: url.to_string(),
                reason: e.to_string()
            });
        }

        Ok(())
    }

    fn pull(&self, path: &Path, branch: &str) -> Result<(), TrackerError> {
        let repo = Self::open(path)?;

        let mut remote = repo
            .find_remote("origin")
            .map_err(|e| git_error("find_remote", &e))?;
        remote
            .fetch(&[branch], None, None)
            .map_err(|e| TrackerError::FetchFailed {
                branch: branch.to_string(),
                reason: e.to_string()
            })?;

        let fetch_head = repo
            .find_reference("FETCH_HEAD")
            .map_err(|e| git_error("find FETCH_HEAD", &e))?;
        let fetched = repo
            .reference_to_annotated_commit(&fetch_head)
            .map_err(|e| git_error("annotate FETCH_HEAD", &e))?;

        let (analysis, _) = repo
            .merge_analysis(&[&fetched])
            .map_err(|e| git_error("merge_analysis", &e))?;

        if analysis.is_up_to_date() {
            debug!("{:?} already up to date on {}", path, branch);
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(TrackerError::Diverged {
                branch: branch.to_string()
            });
        }

        let refname = format!("refs/heads/{branch}");
        match repo.find_branch(branch, BranchType::Local) {
            Ok(local) => {
                local
                    .into_reference()
                    .set_target(fetched.id(), "scribe: fast-forward")
                    .map_err(|e| git_error("set_target", &e))?;
            }
            Err(_) => {
                repo.reference(&refname, fetched.id(), true, "scribe: create branch")
                    .map_err(|e| git_error("create reference", &e))?;
            }
        }

        repo.set_head(&refname)
            .map_err(|e| git_error("set_head", &e))?;
        repo.checkout_head(Some(CheckoutBuilder::new().force()))
            .map_err(|e| git_error("checkout_head", &e))?;

        info!("Fast-forwarded {:?} to {}", path, fetched.id());
        Ok(())
    }

    fn head_commit(&self, path: &Path) -> Result<CommitInfo, TrackerError> {
        let repo = Self::open(path)?;
        let commit = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| git_error("resolve HEAD", &e))?;

        Ok(CommitInfo {
            id: commit.id().to_string(),
            message: commit.message().unwrap_or_default().to_string()
        })
    }

    fn changed_files(
        &self,
        path: &Path,
        from: &str,
        to: &str
    ) -> Result<Vec<String>, TrackerError> {
        let repo = Self::open(path)?;

        let from_tree = match repo.revparse_single(from) {
            Ok(obj) => obj
                .peel_to_tree()
                .map_err(|e| git_error(&format!("resolve {from}"), &e))?,
            // Rewritten upstream history: the old tip is gone from a fresh clone.
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                debug!("Revision {} no longer exists, no diff base", from);
                return Ok(Vec::new());
            }
            Err(e) => return Err(git_error(&format!("resolve {from}"), &e))
        };
        let to_tree = repo
            .revparse_single(to)
            .and_then(|obj| obj.peel_to_tree())
            .map_err(|e| git_error(&format!("resolve {to}"), &e))?;

        let diff = repo
            .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), None)
            .map_err(|e| git_error("diff", &e))?;

        let mut changed = Vec::new();
        diff.foreach(
            &mut |delta, _| {
                if let Some(path) = delta.new_file().path().and_then(|p| p.to_str()) {
                    changed.push(path.to_string());
                }
                true
            },
            None,
            None,
            None
        )
        .map_err(|e| git_error("walk diff", &e))?;

        Ok(changed)
    }
}

fn git_error(operation: &str, e: &git2::Error) -> TrackerError {
    TrackerError::GitError {
        operation: operation.to_string(),
        reason: e.to_string()
    }
}
