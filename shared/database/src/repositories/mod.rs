//! Repository module for database CRUD operations
//!
//! Mongo-backed implementations of the store traits, one collection per
//! document family.

pub mod certificate;
pub mod ship;
pub mod ship_document;
pub mod upload_task;

pub use certificate::CertificateRepository;
pub use ship::ShipRepository;
pub use ship_document::ShipDocumentRepository;
pub use upload_task::UploadTaskRepository;
