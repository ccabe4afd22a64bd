//! # Scribe Utilities
//!
//! Naming, hashing and text helpers shared by the tracker and the pipeline.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use uuid::Uuid;

/// Length of the revision identifiers stored on repository records.
pub const SHORT_REVISION_LEN: usize = 8;

/// Length of the random suffix appended to working-copy directories.
const DIR_SUFFIX_LEN: usize = 6;

static ISSUE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\d+").expect("issue reference pattern is valid"));

/// Compute SHA-256 hash of content string
///
/// # Examples
///
/// ```
/// use utils::compute_content_hash;
///
/// let hash = compute_content_hash("hello world");
/// assert_eq!(hash.len(), 64);
/// ```
#[must_use]
pub fn compute_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive a repository name from its remote URL.
///
/// Takes the last path segment and drops a trailing `.git`.
///
/// ```
/// assert_eq!(utils::repo_name_from_url("https://example.com/org/tool.git"), "tool");
/// ```
#[must_use]
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "repository".to_string()
    } else {
        name.to_string()
    }
}

/// Directory name for a fresh working copy: `<name>_<random hex>`.
#[must_use]
pub fn unique_checkout_dir_name(url: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}_{}", repo_name_from_url(url), &token[..DIR_SUFFIX_LEN])
}

/// Truncate a full commit id to the stored revision length.
#[must_use]
pub fn short_revision(full: &str) -> String {
    full.chars().take(SHORT_REVISION_LEN).collect()
}

/// Normalize a commit message: trim, drop issue references, lowercase.
#[must_use]
pub fn clean_commit_message(message: &str) -> String {
    ISSUE_REF
        .replace_all(message.trim(), "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
