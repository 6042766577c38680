//! # Meridian Core Domain Models
//!
//! Core domain models for the Meridian maritime document management system.
//! All models implement serialization/deserialization with serde; request
//! inputs carry validation rules from the validator crate.
//!
//! ## Key Models
//!
//! - **Ship**: Canonical vessel record with IMO identity used as ground
//!   truth for document validation
//! - **Certificate / ShipDocument**: Persisted document records, one
//!   collection per document family
//! - **ExtractionResult**: Structured output of the classification and
//!   field-extraction pipeline
//! - **BackgroundUploadTask**: Queryable record of a multi-file background
//!   upload with an explicit state machine
//! - **IngestStage / IngestSummary**: Per-file pipeline state machine and
//!   batch response shapes

pub mod document;
pub mod extraction;
pub mod ingest;
pub mod ship;
pub mod task;

#[cfg(test)]
pub mod property_tests;

pub use document::{Certificate, DocumentStatus, ShipDocument};
pub use extraction::{
    DocumentCategory, DuplicateCheck, DuplicateMatch, ExtractedFields, ExtractionResult, FileKind,
    PdfType, ProcessingMethod, ValidationOutcome,
};
pub use ingest::{FileResult, IngestStage, IngestSummary};
pub use ship::Ship;
pub use task::{BackgroundUploadTask, PendingFile, UploadTaskState};
