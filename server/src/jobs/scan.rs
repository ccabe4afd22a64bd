//! The scan pipeline run in the background for `POST /repositories/{id}/scan`.

use analysis::{Drafter, Inventory};
use anyhow::Context;
use chrono::Utc;
use notify::Notifier;
use scribe_core::{ChangeEvent, DocRecord, DraftedDoc, FunctionDescriptor, RepositoryRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::RepositoryTracker;
use tracing::{error, info, instrument, warn};
use utils::compute_content_hash;
use uuid::Uuid;

use crate::telemetry::Telemetry;

/// What one pipeline run found and produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub change: Option<ChangeEvent>,
    pub changed_files: Vec<String>,
    pub missing: usize,
    pub generated: usize
}

pub struct ScanPipeline {
    tracker: Arc<RepositoryTracker>,
    drafter: Arc<Drafter>,
    notifier: Notifier,
    max_drafts: usize
}

impl ScanPipeline {
    pub fn new(
        tracker: Arc<RepositoryTracker>,
        drafter: Arc<Drafter>,
        notifier: Notifier,
        max_drafts: usize
    ) -> Self {
        Self {
            tracker,
            drafter,
            notifier,
            max_drafts
        }
    }

    /// Run the pipeline for `id`, reporting any failure through an error
    /// alert before returning it. `None` means the repository is unknown.
    #[instrument(skip(self))]
    pub async fn run(&self, id: Uuid) -> anyhow::Result<Option<ScanOutcome>> {
        match self.execute(id).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(repo_id = %id, error = %e, "Scan pipeline failed");
                let repo_name = self
                    .tracker
                    .store()
                    .get_repository(id)
                    .await
                    .ok()
                    .flatten()
                    .map(|record| record.name());
                self.notifier
                    .error_alert(&format!("{e:#}"), repo_name.as_deref())
                    .await;
                Err(e)
            }
        }
    }

    async fn execute(&self, id: Uuid) -> anyhow::Result<Option<ScanOutcome>> {
        let Some(record) = self
            .tracker
            .refresh(id)
            .await
            .context("Failed to update working copy")?
        else {
            warn!(repo_id = %id, "Scan skipped, repository not registered");
            return Ok(None);
        };

        let change = self.tracker.scan(id).await.context("Failed to scan revision")?;
        Telemetry::record_scan(change.is_some());

        let Some(event) = change else {
            info!(repo_id = %id, "No new commits");
            return Ok(Some(ScanOutcome::default()));
        };

        let repo_name = record.name();
        let changed_files = self
            .tracker
            .changed_files(&record, &event)
            .await
            .context("Failed to diff revisions")?;
        if !changed_files.is_empty() {
            self.notifier
                .doc_update_needed(&repo_name, &changed_files)
                .await;
        }

        let missing = undocumented_functions(&record).await?;
        let drafts = self.draft_missing(&missing).await;
        let generated: usize = drafts.values().map(Vec::len).sum();

        self.store_drafts(&record, drafts).await?;
        self.notifier
            .scan_completed(&repo_name, missing.len(), generated)
            .await;

        info!(
            repo_id = %id,
            revision = %event.new_revision,
            missing = missing.len(),
            generated,
            "Scan completed"
        );
        Ok(Some(ScanOutcome {
            change: Some(event),
            changed_files,
            missing: missing.len(),
            generated
        }))
    }

    /// Draft up to `max_drafts` docstrings, grouped by file. Failed drafts are
    /// logged and left out.
    async fn draft_missing(
        &self,
        missing: &[(String, FunctionDescriptor)]
    ) -> BTreeMap<String, Vec<DraftedDoc>> {
        let mut drafts: BTreeMap<String, Vec<DraftedDoc>> = BTreeMap::new();

        for (path, function) in missing.iter().take(self.max_drafts) {
            match self.drafter.draft(&function.source).await {
                Ok(docstring) => {
                    Telemetry::record_draft(true);
                    drafts.entry(path.clone()).or_default().push(DraftedDoc {
                        function: function.name.clone(),
                        line: function.start_line,
                        source_hash: compute_content_hash(&function.source),
                        docstring
                    });
                }
                Err(e) => {
                    Telemetry::record_draft(false);
                    warn!(function = %function.name, file = %path, error = %e, "Draft failed");
                }
            }
        }
        drafts
    }

    async fn store_drafts(
        &self,
        record: &RepositoryRecord,
        drafts: BTreeMap<String, Vec<DraftedDoc>>
    ) -> anyhow::Result<()> {
        for (path, drafts) in drafts {
            let doc = DocRecord {
                repository_id: record.id,
                path,
                drafts,
                updated_at: Utc::now()
            };
            self.tracker
                .store()
                .upsert_doc(&doc)
                .await
                .with_context(|| format!("Failed to store drafts for {}", doc.path))?;
        }
        Ok(())
    }
}

/// Undocumented functions of the working copy paired with their path
/// relative to the checkout root.
async fn undocumented_functions(
    record: &RepositoryRecord
) -> anyhow::Result<Vec<(String, FunctionDescriptor)>> {
    let root = PathBuf::from(&record.local_path);
    tokio::task::spawn_blocking(move || {
        Inventory::new(&root)
            .iter()
            .map(|function| (relative_path(&root, &function.file), function))
            .collect::<Vec<_>>()
    })
    .await
    .context("Inventory task failed")
}

fn relative_path(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}
