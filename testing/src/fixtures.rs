use git2::{Oid, Repository, RepositoryInitOptions, Signature, build::CheckoutBuilder};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// A local git repository standing in for a remote.
///
/// Starts on `main` with one commit containing `README.md`. The directory is
/// removed when the fixture drops.
pub struct GitRemote {
    dir: TempDir,
    repo: Repository
}

impl GitRemote {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir for remote");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).expect("init remote");

        let remote = Self { dir, repo };
        remote.commit_file("README.md", "# fixture\n", "Initial commit");
        tracing::debug!("Git remote fixture at {}", remote.url());
        remote
    }

    /// URL to hand to clone operations.
    pub fn url(&self) -> String {
        self.dir.path().display().to_string()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel` and commit it on the current branch.
    pub fn commit_file(&self, rel: &str, contents: &str, message: &str) -> String {
        let full = self.dir.path().join(rel);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&full, contents).expect("write fixture file");

        let mut index = self.repo.index().expect("open index");
        index.add_path(Path::new(rel)).expect("stage file");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");

        let sig = signature();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("commit");
        oid.to_string()
    }

    /// Create `name` at the current HEAD (if missing) and switch to it.
    pub fn checkout_branch(&self, name: &str) {
        if self.repo.find_branch(name, git2::BranchType::Local).is_err() {
            let head = self
                .repo
                .head()
                .and_then(|h| h.peel_to_commit())
                .expect("head commit");
            self.repo.branch(name, &head, false).expect("create branch");
        }
        self.repo
            .set_head(&format!("refs/heads/{name}"))
            .expect("set head");
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))
            .expect("checkout");
    }

    /// Move the current branch back to `commit`, discarding later history.
    pub fn reset_to(&self, commit: &str) {
        let oid = Oid::from_str(commit).expect("commit id");
        let object = self.repo.find_object(oid, None).expect("find commit");
        self.repo
            .reset(&object, git2::ResetType::Hard, None)
            .expect("hard reset");
    }
}

impl Default for GitRemote {
    fn default() -> Self {
        Self::new()
    }
}

fn signature() -> Signature<'static> {
    Signature::now("Scribe Fixture", "fixture@scribe.local").expect("signature")
}

/// Write `files` (relative path, contents) under a fresh temp dir.
pub fn python_tree(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir for tree");
    let root = dir.path().to_path_buf();
    for (rel, contents) in files {
        let full = root.join(rel);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&full, contents).expect("write source file");
    }
    (dir, root)
}
