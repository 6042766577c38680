//! Certificate Repository
//!
//! CRUD operations for the certificates collection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson};
use mongodb::Collection;
use uuid::Uuid;

use meridian_models::{Certificate, DocumentStatus};

use crate::mongodb::MongoDatabase;
use crate::store::CertificateStore;

pub struct CertificateRepository {
    collection: Collection<Certificate>,
}

impl CertificateRepository {
    pub fn new(db: &MongoDatabase) -> Self {
        Self {
            collection: db.collection("certificates"),
        }
    }
}

#[async_trait]
impl CertificateStore for CertificateRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Certificate>> {
        self.collection
            .find_one(doc! {"id": id.to_string()}, None)
            .await
            .context("Failed to fetch certificate by ID")
    }

    async fn list_for_ship(&self, ship_id: Uuid) -> Result<Vec<Certificate>> {
        let cursor = self
            .collection
            .find(doc! {"ship_id": ship_id.to_string()}, None)
            .await
            .context("Failed to fetch certificates by ship")?;
        cursor
            .try_collect()
            .await
            .context("Failed to read certificate cursor")
    }

    async fn create(&self, certificate: Certificate) -> Result<Certificate> {
        self.collection
            .insert_one(&certificate, None)
            .await
            .context("Failed to create certificate")?;
        Ok(certificate)
    }

    async fn set_file_refs(
        &self,
        id: Uuid,
        file_id: Option<String>,
        summary_file_id: Option<String>,
        status: DocumentStatus,
    ) -> Result<()> {
        let status = to_bson(&status).context("Failed to encode status")?;
        self.collection
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
            .context("Failed to update certificate file references")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Certificate>> {
        self.collection
            .find_one_and_delete(doc! {"id": id.to_string()}, None)
            .await
            .context("Failed to delete certificate")
    }
}
