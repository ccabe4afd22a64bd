//! Background job queue.
//!
//! Jobs are handed to a single worker over an mpsc channel and spawned into a
//! `JoinSet`, so submitting never waits on the work itself.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::telemetry::Telemetry;

type JobFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

struct Job {
    name: String,
    future: JobFuture
}

pub struct TaskQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>
}

impl TaskQueue {
    /// Spawn the worker on the current runtime.
    pub fn start() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(receiver));

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker))
        }
    }

    /// Queue `future` under `name`. Returns `false` once the queue is shut
    /// down.
    pub fn submit<F>(&self, name: &str, future: F) -> bool
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static
    {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            warn!(job = name, "Task queue is closed, dropping job");
            return false;
        };

        let job = Job {
            name: name.to_string(),
            future: Box::pin(future)
        };
        if sender.send(job).is_err() {
            warn!(job = name, "Task queue worker is gone, dropping job");
            return false;
        }
        debug!(job = name, "Job queued");
        true
    }

    /// Stop accepting jobs and wait for every queued and running job.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, "Task queue worker panicked");
            }
        }
        info!("Task queue drained");
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<Job>) {
    let mut running = JoinSet::new();

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Some(job) => {
                    running.spawn(run_job(job));
                }
                None => break
            },
            Some(finished) = running.join_next(), if !running.is_empty() => {
                log_join(finished);
            }
        }
    }

    while let Some(finished) = running.join_next().await {
        log_join(finished);
    }
}

async fn run_job(job: Job) {
    match job.future.await {
        Ok(()) => {
            debug!(job = %job.name, "Job finished");
            Telemetry::record_job(&job.name, true);
        }
        Err(e) => {
            error!(job = %job.name, error = %e, "Background job failed");
            Telemetry::record_job(&job.name, false);
        }
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Background job panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_waits_for_queued_jobs() {
        let queue = TaskQueue::start();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            assert!(queue.submit("count", async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        queue.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_job_does_not_stop_worker() {
        let queue = TaskQueue::start();
        let done = Arc::new(AtomicUsize::new(0));

        queue.submit("fail", async { Err(anyhow::anyhow!("boom")) });
        let counter = done.clone();
        queue.submit("ok", async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        queue.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let queue = TaskQueue::start();
        queue.shutdown().await;
        assert!(!queue.submit("late", async { Ok(()) }));
    }
}
