//! Store traits for the document collections.
//!
//! The persistence layer is a generic document store: each trait exposes the
//! find/create/update/delete surface one consumer needs, nothing more. Mongo
//! implementations live in `repositories`; in-memory implementations in
//! `memory` back the unit tests.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use meridian_models::{
    BackgroundUploadTask, Certificate, DocumentCategory, DocumentStatus, Ship, ShipDocument,
    UploadTaskState,
};

/// Read-only access to ship records. Ships are owned by the fleet API; the
/// ingestion pipeline never writes them.
#[async_trait]
pub trait ShipStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Ship>>;
}

#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Certificate>>;
    async fn list_for_ship(&self, ship_id: Uuid) -> Result<Vec<Certificate>>;
    async fn create(&self, certificate: Certificate) -> Result<Certificate>;
    /// Update the remote file references set by the background uploader.
    /// Touches nothing but the refs, the status and `updated_at`.
    async fn set_file_refs(
        &self,
        id: Uuid,
        file_id: Option<String>,
        summary_file_id: Option<String>,
        status: DocumentStatus,
    ) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<Option<Certificate>>;
}

/// Audit reports, approval documents and other documents: one collection per
/// family, same record shape.
#[async_trait]
pub trait ShipDocumentStore: Send + Sync {
    async fn get(&self, category: DocumentCategory, id: Uuid) -> Result<Option<ShipDocument>>;
    async fn create(&self, document: ShipDocument) -> Result<ShipDocument>;
    async fn set_file_refs(
        &self,
        category: DocumentCategory,
        id: Uuid,
        file_id: Option<String>,
        summary_file_id: Option<String>,
        status: DocumentStatus,
    ) -> Result<()>;
    async fn delete(&self, category: DocumentCategory, id: Uuid) -> Result<Option<ShipDocument>>;
}

#[async_trait]
pub trait UploadTaskStore: Send + Sync {
    async fn create(&self, task: BackgroundUploadTask) -> Result<BackgroundUploadTask>;
    async fn get(&self, task_id: Uuid) -> Result<Option<BackgroundUploadTask>>;
    /// Full-record replace. Only safe for owner-driven mutations; the
    /// worker uses the conditional methods below so it never overwrites a
    /// cancel that landed while a file was in flight.
    async fn update(&self, task: BackgroundUploadTask) -> Result<()>;
    /// Atomically pop the head of the pending queue and bump the processed
    /// counter, but only while the task is still `Processing`. Returns the
    /// updated task, or `None` when the task left `Processing` concurrently.
    async fn record_progress(&self, task_id: Uuid) -> Result<Option<BackgroundUploadTask>>;
    /// Move a `Processing` task into a terminal state, dropping any queued
    /// files. Returns false when the task is no longer `Processing`,
    /// leaving the concurrent writer's state in place.
    async fn finish_processing(&self, task_id: Uuid, state: UploadTaskState) -> Result<bool>;
}
