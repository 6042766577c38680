//! Upload Task Repository
//!
//! Background upload task records survive process restarts so task status
//! stays queryable and cancellable.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, to_bson};
use mongodb::options::{FindOneAndUpdateOptions, ReplaceOptions, ReturnDocument};
use mongodb::Collection;
use uuid::Uuid;

use meridian_models::{BackgroundUploadTask, UploadTaskState};

use crate::mongodb::MongoDatabase;
use crate::store::UploadTaskStore;

pub struct UploadTaskRepository {
    collection: Collection<BackgroundUploadTask>,
}

impl UploadTaskRepository {
    pub fn new(db: &MongoDatabase) -> Self {
        Self {
            collection: db.collection("upload_tasks"),
        }
    }
}

#[async_trait]
impl UploadTaskStore for UploadTaskRepository {
    async fn create(&self, task: BackgroundUploadTask) -> Result<BackgroundUploadTask> {
        self.collection
            .insert_one(&task, None)
            .await
            .context("Failed to create upload task")?;
        Ok(task)
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<BackgroundUploadTask>> {
        self.collection
            .find_one(doc! {"task_id": task_id.to_string()}, None)
            .await
            .context("Failed to fetch upload task")
    }

    async fn update(&self, task: BackgroundUploadTask) -> Result<()> {
        self.collection
            .replace_one(
                doc! {"task_id": task.task_id.to_string()},
                &task,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await
            .context("Failed to update upload task")?;
        Ok(())
    }

    async fn record_progress(&self, task_id: Uuid) -> Result<Option<BackgroundUploadTask>> {
        // Filtering on the state makes the pop-and-count atomic against a
        // concurrent cancel, which clears the queue and wins.
        self.collection
            .find_one_and_update(
                doc! {
                    "task_id": task_id.to_string(),
                    "state": to_bson(&UploadTaskState::Processing)?,
                },
                doc! {
                    "$pop": {"pending": -1},
                    "$inc": {"processed_files": 1},
                    "$set": {"updated_at": to_bson(&Utc::now())?},
                },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await
            .context("Failed to record upload task progress")
    }

    async fn finish_processing(&self, task_id: Uuid, state: UploadTaskState) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! {
                    "task_id": task_id.to_string(),
                    "state": to_bson(&UploadTaskState::Processing)?,
                },
                doc! {"$set": {
                    "state": to_bson(&state)?,
                    "pending": [],
                    "updated_at": to_bson(&Utc::now())?,
                }},
                None,
            )
            .await
            .context("Failed to finish upload task")?;
        Ok(result.modified_count > 0)
    }
}
