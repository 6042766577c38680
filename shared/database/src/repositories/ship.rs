//! Ship Repository
//!
//! Read access to the canonical vessel records. Ships are created through
//! the fleet management API; the ingestion pipeline only looks them up.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::Collection;
use uuid::Uuid;

use meridian_models::Ship;

use crate::mongodb::MongoDatabase;
use crate::store::ShipStore;

pub struct ShipRepository {
    collection: Collection<Ship>,
}

impl ShipRepository {
    pub fn new(db: &MongoDatabase) -> Self {
        Self {
            collection: db.collection("ships"),
        }
    }
}

#[async_trait]
impl ShipStore for ShipRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Ship>> {
        self.collection
            .find_one(doc! {"id": id.to_string()}, None)
            .await
            .context("Failed to fetch ship by ID")
    }
}
