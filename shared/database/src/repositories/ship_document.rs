//! Ship Document Repository
//!
//! Audit reports, approval documents and other documents share one record
//! shape but live in separate collections; the category selects the
//! collection at call time.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, to_bson};
use mongodb::Collection;
use uuid::Uuid;

use meridian_models::{DocumentCategory, DocumentStatus, ShipDocument};

use crate::mongodb::MongoDatabase;
use crate::store::ShipDocumentStore;

pub struct ShipDocumentRepository {
    db: MongoDatabase,
}

impl ShipDocumentRepository {
    pub fn new(db: &MongoDatabase) -> Self {
        Self { db: db.clone() }
    }

    fn collection(&self, category: DocumentCategory) -> Collection<ShipDocument> {
        self.db.collection(category.collection())
    }
}

#[async_trait]
impl ShipDocumentStore for ShipDocumentRepository {
    async fn get(&self, category: DocumentCategory, id: Uuid) -> Result<Option<ShipDocument>> {
        self.collection(category)
            .find_one(doc! {"id": id.to_string()}, None)
            .await
            .context("Failed to fetch document by ID")
    }

    async fn create(&self, document: ShipDocument) -> Result<ShipDocument> {
        self.collection(document.category)
            .insert_one(&document, None)
            .await
            .context("Failed to create document")?;
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
        let status = to_bson(&status).context("Failed to encode status")?;
        self.collection(category)
            .update_one(
                doc! {"id": id.to_string()},
                doc! {"$set": {
                    "file_id": file_id,
                    "summary_file_id": summary_file_id,
                    "status": status,
                    "updated_at": to_bson(&Utc::now())?,
                }},
                None,
            )
            .await
            .context("Failed to update document file references")?;
        Ok(())
    }

    async fn delete(&self, category: DocumentCategory, id: Uuid) -> Result<Option<ShipDocument>> {
        self.collection(category)
            .find_one_and_delete(doc! {"id": id.to_string()}, None)
            .await
            .context("Failed to delete document")
    }
}
