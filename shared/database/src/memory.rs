//! In-memory store implementations.
//!
//! Back the unit tests and local development without a running MongoDB.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use meridian_models::{
    BackgroundUploadTask, Certificate, DocumentCategory, DocumentStatus, Ship, ShipDocument,
    UploadTaskState,
};

use crate::store::{CertificateStore, ShipDocumentStore, ShipStore, UploadTaskStore};

#[derive(Clone, Default)]
pub struct MemoryShipStore {
    ships: Arc<RwLock<HashMap<Uuid, Ship>>>,
}

impl MemoryShipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, ship: Ship) {
        self.ships.write().await.insert(ship.id, ship);
    }
}

#[async_trait]
impl ShipStore for MemoryShipStore {
    async fn get(&self, id: Uuid) -> Result<Option<Ship>> {
        Ok(self.ships.read().await.get(&id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct MemoryCertificateStore {
    certificates: Arc<RwLock<HashMap<Uuid, Certificate>>>,
}

impl MemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateStore for MemoryCertificateStore {
    async fn get(&self, id: Uuid) -> Result<Option<Certificate>> {
        Ok(self.certificates.read().await.get(&id).cloned())
    }

    async fn list_for_ship(&self, ship_id: Uuid) -> Result<Vec<Certificate>> {
        let certs = self.certificates.read().await;
        Ok(certs
            .values()
            .filter(|c| c.ship_id == ship_id)
            .cloned()
            .collect())
    }

    async fn create(&self, certificate: Certificate) -> Result<Certificate> {
        self.certificates
            .write()
            .await
            .insert(certificate.id, certificate.clone());
        Ok(certificate)
    }

    async fn set_file_refs(
        &self,
        id: Uuid,
        file_id: Option<String>,
        summary_file_id: Option<String>,
        status: DocumentStatus,
    ) -> Result<()> {
        let mut certs = self.certificates.write().await;
        if let Some(cert) = certs.get_mut(&id) {
            cert.file_id = file_id;
            cert.summary_file_id = summary_file_id;
            cert.status = status;
            cert.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Certificate>> {
        Ok(self.certificates.write().await.remove(&id))
    }
}

#[derive(Clone, Default)]
pub struct MemoryShipDocumentStore {
    documents: Arc<RwLock<HashMap<(DocumentCategory, Uuid), ShipDocument>>>,
}

impl MemoryShipDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents for one ship across categories. Test helper.
    pub async fn list_for_ship(&self, ship_id: Uuid) -> Vec<ShipDocument> {
        self.documents
            .read()
            .await
            .values()
            .filter(|d| d.ship_id == ship_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ShipDocumentStore for MemoryShipDocumentStore {
    async fn get(&self, category: DocumentCategory, id: Uuid) -> Result<Option<ShipDocument>> {
        Ok(self.documents.read().await.get(&(category, id)).cloned())
    }

    async fn create(&self, document: ShipDocument) -> Result<ShipDocument> {
        self.documents
            .write()
            .await
            .insert((document.category, document.id), document.clone());
        Ok(document)
    }

    async fn set_file_refs(
        &self,
        category: DocumentCategory,
        id: Uuid,
        file_id: Option<String>,
        summary_file_id: Option<String>,
        status: DocumentStatus,
    ) -> Result<()> {
        let mut docs = self.documents.write().await;
        if let Some(doc) = docs.get_mut(&(category, id)) {
            doc.file_id = file_id;
            doc.summary_file_id = summary_file_id;
            doc.status = status;
            doc.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, category: DocumentCategory, id: Uuid) -> Result<Option<ShipDocument>> {
        Ok(self.documents.write().await.remove(&(category, id)))
    }
}

#[derive(Clone, Default)]
pub struct MemoryUploadTaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, BackgroundUploadTask>>>,
}

impl MemoryUploadTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadTaskStore for MemoryUploadTaskStore {
    async fn create(&self, task: BackgroundUploadTask) -> Result<BackgroundUploadTask> {
        self.tasks.write().await.insert(task.task_id, task.clone());
        Ok(task)
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<BackgroundUploadTask>> {
        Ok(self.tasks.read().await.get(&task_id).cloned())
    }

    async fn update(&self, task: BackgroundUploadTask) -> Result<()> {
        self.tasks.write().await.insert(task.task_id, task);
        Ok(())
    }

    async fn record_progress(&self, task_id: Uuid) -> Result<Option<BackgroundUploadTask>> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task_id) {
            Some(task) if task.state == UploadTaskState::Processing => {
                if !task.pending.is_empty() {
                    task.pending.remove(0);
                }
                task.processed_files += 1;
                task.updated_at = Utc::now();
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn finish_processing(&self, task_id: Uuid, state: UploadTaskState) -> Result<bool> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task_id) {
            Some(task) if task.state == UploadTaskState::Processing => {
                task.state = state;
                task.pending.clear();
                task.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_models::ExtractedFields;

    #[tokio::test]
    async fn test_certificate_file_ref_update_preserves_fields() {
        let store = MemoryCertificateStore::new();
        let fields = ExtractedFields {
            cert_name: "Load Line Certificate".to_string(),
            cert_no: "LL-2024-001".to_string(),
            issue_date: "2024-01-15".to_string(),
            issued_by: "DNV".to_string(),
            ..Default::default()
        };
        let cert = Certificate::from_extracted(Uuid::new_v4(), &fields);
        let id = cert.id;
        store.create(cert).await.unwrap();

        // Record exists with file_id = null: upload pending, not an error.
        let pending = store.get(id).await.unwrap().unwrap();
        assert!(pending.file_id.is_none());
        assert_eq!(pending.status, DocumentStatus::UploadPending);

        store
            .set_file_refs(
                id,
                Some("drive-file-1".to_string()),
                Some("drive-summary-1".to_string()),
                DocumentStatus::Active,
            )
            .await
            .unwrap();

        let updated = store.get(id).await.unwrap().unwrap();
        assert_eq!(updated.file_id.as_deref(), Some("drive-file-1"));
        assert_eq!(updated.summary_file_id.as_deref(), Some("drive-summary-1"));
        assert_eq!(updated.status, DocumentStatus::Active);
        // Other previously-set fields are untouched.
        assert_eq!(updated.cert_name, "Load Line Certificate");
        assert_eq!(updated.cert_no, "LL-2024-001");
        assert_eq!(updated.issue_date, "2024-01-15");
        assert_eq!(updated.issued_by, "DNV");
    }

    #[tokio::test]
    async fn test_list_for_ship_filters_by_ship() {
        let store = MemoryCertificateStore::new();
        let ship_a = Uuid::new_v4();
        let ship_b = Uuid::new_v4();
        store
            .create(Certificate::from_extracted(ship_a, &ExtractedFields::default()))
            .await
            .unwrap();
        store
            .create(Certificate::from_extracted(ship_b, &ExtractedFields::default()))
            .await
            .unwrap();

        assert_eq!(store.list_for_ship(ship_a).await.unwrap().len(), 1);
        assert_eq!(store.list_for_ship(ship_b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_progress_refuses_non_processing_task() {
        let store = MemoryUploadTaskStore::new();
        let mut task = BackgroundUploadTask::new(Uuid::new_v4(), Uuid::new_v4(), 1);
        task.state = UploadTaskState::Processing;
        task.pending.push(meridian_models::PendingFile {
            filename: "a.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content_base64: String::new(),
        });
        let id = task.task_id;
        store.create(task.clone()).await.unwrap();

        let progressed = store.record_progress(id).await.unwrap().unwrap();
        assert_eq!(progressed.processed_files, 1);
        assert!(progressed.pending.is_empty());

        // Once the task leaves Processing, worker progress writes are no-ops.
        task.state = UploadTaskState::Cancelled;
        task.pending.clear();
        store.update(task).await.unwrap();
        assert!(store.record_progress(id).await.unwrap().is_none());
        assert!(!store
            .finish_processing(id, UploadTaskState::Completed)
            .await
            .unwrap());
        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.state, UploadTaskState::Cancelled);
    }

    #[tokio::test]
    async fn test_task_update_roundtrip() {
        let store = MemoryUploadTaskStore::new();
        let mut task = BackgroundUploadTask::new(Uuid::new_v4(), Uuid::new_v4(), 3);
        let id = task.task_id;
        store.create(task.clone()).await.unwrap();

        task.state = meridian_models::UploadTaskState::Receiving;
        task.received_files = 1;
        store.update(task).await.unwrap();

        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.received_files, 1);
        assert_eq!(fetched.state, meridian_models::UploadTaskState::Receiving);
    }
}
