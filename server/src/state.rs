use analysis::Drafter;
use notify::Notifier;
use std::sync::Arc;
use storage::RepositoryTracker;

use crate::jobs::{ScanPipeline, TaskQueue};

/// Shared handles for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<RepositoryTracker>,
    pub notifier: Notifier,
    pub pipeline: Arc<ScanPipeline>,
    pub queue: Arc<TaskQueue>
}

impl AppState {
    /// Wire the scan pipeline and start the background queue.
    pub fn new(
        tracker: Arc<RepositoryTracker>,
        drafter: Arc<Drafter>,
        notifier: Notifier,
        max_drafts_per_scan: usize
    ) -> Self {
        let pipeline = Arc::new(ScanPipeline::new(
            tracker.clone(),
            drafter,
            notifier.clone(),
            max_drafts_per_scan
        ));

        Self {
            tracker,
            notifier,
            pipeline,
            queue: Arc::new(TaskQueue::start())
        }
    }
}
