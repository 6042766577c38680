//! Per-file ingestion state machine and batch response shapes.

use serde::{Deserialize, Serialize};

use crate::extraction::{DocumentCategory, ExtractedFields};

/// Stages a single uploaded file moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    /// File accepted from the request body.
    Received,
    /// Type detector classified the bytes.
    Detected,
    /// Router produced raw text.
    Extracted,
    /// Identity validator ran.
    Validated,
    /// Duplicate detector ran.
    DuplicateChecked,
    /// Database record committed.
    RecordCreated,
    /// File and summary upload handed to the background runner.
    UploadScheduled,
    /// Pipeline finished for this file.
    Done,
    /// Identity mismatch; no record created.
    Blocked,
    /// Classified into a non-target category for this endpoint.
    Skipped,
    /// Unrecovered extraction or storage failure.
    Error,
}

impl IngestStage {
    /// Check if transition is valid. Validation must complete before the
    /// duplicate check, and both before record creation.
    pub fn can_transition_to(&self, target: IngestStage) -> bool {
        use IngestStage::*;

        match (self, target) {
            (Received, Detected) => true,
            (Received, Error) => true,

            (Detected, Extracted) => true,
            (Detected, Error) => true,

            (Extracted, Validated) => true,
            (Extracted, Skipped) => true,
            (Extracted, Error) => true,

            (Validated, DuplicateChecked) => true,
            (Validated, Blocked) => true,
            (Validated, Error) => true,

            (DuplicateChecked, RecordCreated) => true,
            (DuplicateChecked, Skipped) => true,
            (DuplicateChecked, Error) => true,

            (RecordCreated, UploadScheduled) => true,
            (RecordCreated, Error) => true,

            (UploadScheduled, Done) => true,

            // Terminal states cannot transition
            (Done, _) => false,
            (Blocked, _) => false,
            (Skipped, _) => false,
            (Error, _) => false,

            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestStage::Done | IngestStage::Blocked | IngestStage::Skipped | IngestStage::Error
        )
    }
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Detected => write!(f, "detected"),
            Self::Extracted => write!(f, "extracted"),
            Self::Validated => write!(f, "validated"),
            Self::DuplicateChecked => write!(f, "duplicate_checked"),
            Self::RecordCreated => write!(f, "record_created"),
            Self::UploadScheduled => write!(f, "upload_scheduled"),
            Self::Done => write!(f, "success"),
            Self::Blocked => write!(f, "blocked"),
            Self::Skipped => write!(f, "skipped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Per-file outcome reported in the batch response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub filename: String,
    pub status: IngestStage,
    pub category: Option<DocumentCategory>,
    pub ship_name: String,
    pub certificate_created: bool,
    pub google_drive_uploaded: bool,
    pub errors: Vec<String>,
    pub extracted: Option<ExtractedFields>,
    /// Ship-name discrepancy note, when present.
    pub note: Option<String>,
}

impl FileResult {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: IngestStage::Received,
            category: None,
            ship_name: String::new(),
            certificate_created: false,
            google_drive_uploaded: false,
            errors: Vec::new(),
            extracted: None,
            note: None,
        }
    }
}

/// Aggregated response for one multi-file request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    pub total_files: usize,
    pub successful_uploads: usize,
    pub certificates_created: usize,
    pub results: Vec<FileResult>,
}

impl IngestSummary {
    pub fn from_results(results: Vec<FileResult>) -> Self {
        let successful_uploads = results
            .iter()
            .filter(|r| r.status == IngestStage::Done)
            .count();
        let certificates_created = results.iter().filter(|r| r.certificate_created).count();
        Self {
            total_files: results.len(),
            successful_uploads,
            certificates_created,
            results,
        }
    }
}
