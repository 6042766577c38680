pub mod memory;
pub mod mongodb;
pub mod repositories;
pub mod store;

pub use memory::{
    MemoryCertificateStore, MemoryShipDocumentStore, MemoryShipStore, MemoryUploadTaskStore,
};
pub use mongodb::{create_mongo_client, get_database, ping, MongoClient, MongoDatabase};
pub use repositories::*;
pub use store::{CertificateStore, ShipDocumentStore, ShipStore, UploadTaskStore};
