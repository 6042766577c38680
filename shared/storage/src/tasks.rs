//! Background task runner.
//!
//! Fire-and-forget jobs decoupled from the request/response cycle: remote
//! file uploads after a record is committed and remote deletions after a
//! record is removed. Jobs run sequentially on one worker so the quota-
//! limited gateway is never hammered by a burst of parallel transfers.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Clone)]
pub struct BackgroundRunner {
    tx: mpsc::UnboundedSender<Job>,
}

impl BackgroundRunner {
    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
            tracing::debug!("Background runner worker stopped");
        });
        Self { tx }
    }

    /// Schedule a job. Never blocks the caller; a dropped job (runner shut
    /// down) is logged, not raised — storage mutations are best-effort by
    /// contract.
    pub fn schedule<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.tx.send(Box::pin(job)).is_err() {
            tracing::warn!("Background runner is shut down; job dropped");
        }
    }

    /// Wait until every job scheduled before this call has finished.
    /// The worker is serial, so a sentinel job acts as a barrier.
    pub async fn drain(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.schedule(async move {
            let _ = done_tx.send(());
        });
        let _ = done_rx.await;
    }
}

impl Default for BackgroundRunner {
    fn default() -> Self {
        Self::new()
    }
}
