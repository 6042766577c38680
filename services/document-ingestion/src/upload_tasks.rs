//! Multi-file background upload tasks.
//!
//! A task buffers files across several requests (folder uploads from the
//! client arrive one file at a time), then feeds them to the ingestion
//! pipeline on the background worker once the announced count has arrived.
//! Tasks are owned by the user who created them; every mutation checks
//! ownership. Cancellation is checked between files, so a cancel lands
//! before the next file starts rather than mid-transfer; the worker's
//! progress writes are conditional on the task still being in
//! `Processing`, so a cancel that arrives while a file is in flight is
//! never overwritten.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use uuid::Uuid;

use meridian_database::UploadTaskStore;
use meridian_models::{BackgroundUploadTask, PendingFile, UploadTaskState};
use meridian_storage::BackgroundRunner;
use meridian_utils::{MeridianError, MeridianResult};

use crate::orchestrator::{IngestionOrchestrator, UploadCandidate, UploadOptions};

pub struct TaskManager {
    tasks: Arc<dyn UploadTaskStore>,
    orchestrator: Arc<IngestionOrchestrator>,
    runner: BackgroundRunner,
}

impl TaskManager {
    pub fn new(
        tasks: Arc<dyn UploadTaskStore>,
        orchestrator: Arc<IngestionOrchestrator>,
        runner: BackgroundRunner,
    ) -> Self {
        Self {
            tasks,
            orchestrator,
            runner,
        }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        ship_id: Uuid,
        total_files: usize,
    ) -> MeridianResult<BackgroundUploadTask> {
        if total_files == 0 {
            return Err(MeridianError::validation(
                "total_files",
                "a task must announce at least one file",
            ));
        }
        let task = BackgroundUploadTask::new(owner_id, ship_id, total_files);
        self.tasks
            .create(task)
            .await
            .map_err(|e| MeridianError::database(e.to_string()))
    }

    /// Attach one file to the task. When the announced count is reached the
    /// task flips to `Processing` and the pipeline run is scheduled.
    pub async fn add_file(
        &self,
        task_id: Uuid,
        owner_id: Uuid,
        file: PendingFile,
    ) -> MeridianResult<BackgroundUploadTask> {
        let mut task = self.load_owned(task_id, owner_id).await?;

        if !matches!(
            task.state,
            UploadTaskState::Pending | UploadTaskState::Receiving
        ) {
            return Err(MeridianError::validation(
                "state",
                format!("task in state {} is not accepting files", task.state),
            ));
        }
        if task.all_received() {
            return Err(MeridianError::validation(
                "state",
                "task already received its announced file count",
            ));
        }

        if task.state == UploadTaskState::Pending {
            task.state = UploadTaskState::Receiving;
        }
        task.pending.push(file);
        task.received_files += 1;
        task.updated_at = chrono::Utc::now();

        let ready = task.all_received();
        if ready {
            task.state = UploadTaskState::Processing;
        }
        self.tasks
            .update(task.clone())
            .await
            .map_err(|e| MeridianError::database(e.to_string()))?;

        if ready {
            self.schedule_processing(task.task_id);
        }
        Ok(task)
    }

    pub async fn cancel(
        &self,
        task_id: Uuid,
        owner_id: Uuid,
    ) -> MeridianResult<BackgroundUploadTask> {
        let mut task = self.load_owned(task_id, owner_id).await?;

        if !task.state.can_transition_to(UploadTaskState::Cancelled) {
            return Err(MeridianError::validation(
                "state",
                format!("task in state {} cannot be cancelled", task.state),
            ));
        }
        task.state = UploadTaskState::Cancelled;
        task.pending.clear();
        task.updated_at = chrono::Utc::now();
        self.tasks
            .update(task.clone())
            .await
            .map_err(|e| MeridianError::database(e.to_string()))?;
        Ok(task)
    }

    pub async fn status(
        &self,
        task_id: Uuid,
        owner_id: Uuid,
    ) -> MeridianResult<BackgroundUploadTask> {
        self.load_owned(task_id, owner_id).await
    }

    async fn load_owned(
        &self,
        task_id: Uuid,
        owner_id: Uuid,
    ) -> MeridianResult<BackgroundUploadTask> {
        let task = self
            .tasks
            .get(task_id)
            .await
            .map_err(|e| MeridianError::database(e.to_string()))?
            .ok_or_else(|| MeridianError::not_found(format!("upload task {}", task_id)))?;
        if task.owner_id != owner_id {
            return Err(MeridianError::authorization(
                "upload task belongs to another user",
            ));
        }
        Ok(task)
    }

    fn schedule_processing(&self, task_id: Uuid) {
        let tasks = self.tasks.clone();
        let orchestrator = self.orchestrator.clone();
        self.runner.schedule(async move {
            if let Err(e) = run_task(tasks, orchestrator, task_id).await {
                tracing::error!(task_id = %task_id, error = %e, "Upload task processing failed");
            }
        });
    }
}

/// Drain a task's pending queue through the pipeline, one file at a time,
/// re-reading the task between files so a cancel takes effect promptly.
/// All worker writes are conditional on the task still being `Processing`;
/// a concurrent cancel wins and the worker stops without touching it.
async fn run_task(
    tasks: Arc<dyn UploadTaskStore>,
    orchestrator: Arc<IngestionOrchestrator>,
    task_id: Uuid,
) -> MeridianResult<()> {
    loop {
        let task = tasks
            .get(task_id)
            .await
            .map_err(|e| MeridianError::database(e.to_string()))?
            .ok_or_else(|| MeridianError::not_found(format!("upload task {}", task_id)))?;

        if task.state == UploadTaskState::Cancelled {
            tracing::info!(task_id = %task_id, "Upload task cancelled; stopping");
            return Ok(());
        }
        let Some(file) = task.pending.first().cloned() else {
            if tasks
                .finish_processing(task_id, UploadTaskState::Completed)
                .await
                .map_err(|e| MeridianError::database(e.to_string()))?
            {
                tracing::info!(task_id = %task_id, "Upload task completed");
            }
            return Ok(());
        };

        match decode_pending(&file) {
            Ok(candidate) => {
                let outcome = orchestrator
                    .ingest_batch(task.ship_id, UploadOptions::default(), vec![candidate])
                    .await;
                match outcome {
                    Ok(summary) => {
                        tracing::info!(
                            task_id = %task_id,
                            filename = %file.filename,
                            status = %summary.results[0].status,
                            "Upload task processed file"
                        );
                    }
                    Err(e) => {
                        // Ship gone mid-task: the remaining files cannot
                        // succeed either.
                        tasks
                            .finish_processing(task_id, UploadTaskState::Failed)
                            .await
                            .map_err(|e| MeridianError::database(e.to_string()))?;
                        return Err(e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %task_id,
                    filename = %file.filename,
                    error = %e,
                    "Skipping undecodable file"
                );
            }
        }

        // Pop-and-count refuses once the task has left Processing, so a
        // cancel that landed while this file was in flight keeps its
        // cleared queue and terminal state.
        if tasks
            .record_progress(task_id)
            .await
            .map_err(|e| MeridianError::database(e.to_string()))?
            .is_none()
        {
            tracing::info!(task_id = %task_id, "Upload task cancelled mid-file; stopping");
            return Ok(());
        }
    }
}

fn decode_pending(file: &PendingFile) -> MeridianResult<UploadCandidate> {
    let bytes = BASE64
        .decode(&file.content_base64)
        .map_err(|e| MeridianError::validation("content_base64", e.to_string()))?;
    Ok(UploadCandidate {
        filename: file.filename.clone(),
        content_type: file.content_type.clone(),
        bytes,
    })
}
