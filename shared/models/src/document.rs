//! Persisted document records, one family per collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extraction::{DocumentCategory, ExtractedFields, ProcessingMethod};

/// Lifecycle of a persisted document's remote file.
///
/// `file_id = None` between DB commit and background upload completion is a
/// valid, queryable state meaning "upload pending", not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Record committed, remote upload not yet finished.
    UploadPending,
    /// Remote file and summary are in place.
    Active,
    /// Background upload exhausted retries; needs reconciliation.
    UploadFailed,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UploadPending => write!(f, "upload_pending"),
            Self::Active => write!(f, "active"),
            Self::UploadFailed => write!(f, "upload_failed"),
        }
    }
}

/// A marine certificate attached to a ship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub ship_id: Uuid,
    pub cert_name: String,
    pub cert_type: String,
    pub cert_no: String,
    /// Dates kept as extracted strings; certificates in the wild mix
    /// formats and partial dates.
    pub issue_date: String,
    pub valid_date: String,
    /// Issuing authority, normalized to a registry abbreviation.
    pub issued_by: String,
    /// Remote storage reference for the original file. None until the
    /// background upload completes.
    pub file_id: Option<String>,
    /// Remote storage reference for the generated summary file.
    pub summary_file_id: Option<String>,
    pub status: DocumentStatus,
    /// Informational note when the extracted ship name differed from the
    /// target ship.
    pub name_note: Option<String>,
    pub processing_method: Option<ProcessingMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    pub fn from_extracted(ship_id: Uuid, fields: &ExtractedFields) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            ship_id,
            cert_name: fields.cert_name.clone(),
            cert_type: fields.cert_type.clone(),
            cert_no: fields.cert_no.clone(),
            issue_date: fields.issue_date.clone(),
            valid_date: fields.valid_date.clone(),
            issued_by: fields.issued_by.clone(),
            file_id: None,
            summary_file_id: None,
            status: DocumentStatus::UploadPending,
            name_note: None,
            processing_method: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The field set compared by the duplicate detector.
    pub fn compared_fields(&self) -> [&str; 6] {
        [
            &self.cert_name,
            &self.cert_type,
            &self.cert_no,
            &self.issue_date,
            &self.valid_date,
            &self.issued_by,
        ]
    }
}

/// Audit reports, approval documents and other documents share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipDocument {
    pub id: Uuid,
    pub ship_id: Uuid,
    pub title: String,
    pub category: DocumentCategory,
    /// Caller-supplied document date, kept as a free-form string like the
    /// extracted certificate dates.
    pub date: Option<String>,
    /// Caller-supplied note attached at upload time.
    pub note: Option<String>,
    pub file_id: Option<String>,
    pub summary_file_id: Option<String>,
    pub status: DocumentStatus,
    pub name_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipDocument {
    pub fn new(ship_id: Uuid, title: impl Into<String>, category: DocumentCategory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            ship_id,
            title: title.into(),
            category,
            date: None,
            note: None,
            file_id: None,
            summary_file_id: None,
            status: DocumentStatus::UploadPending,
            name_note: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_certificate_starts_upload_pending() {
        let fields = ExtractedFields {
            cert_name: "Safety Management Certificate".to_string(),
            cert_no: "SMC-1001".to_string(),
            ..Default::default()
        };
        let cert = Certificate::from_extracted(Uuid::new_v4(), &fields);
        assert_eq!(cert.status, DocumentStatus::UploadPending);
        assert!(cert.file_id.is_none());
        assert!(cert.summary_file_id.is_none());
    }

    #[test]
    fn test_compared_fields_order() {
        let fields = ExtractedFields {
            cert_name: "a".into(),
            cert_type: "b".into(),
            cert_no: "c".into(),
            issue_date: "d".into(),
            valid_date: "e".into(),
            issued_by: "f".into(),
            ..Default::default()
        };
        let cert = Certificate::from_extracted(Uuid::new_v4(), &fields);
        assert_eq!(cert.compared_fields(), ["a", "b", "c", "d", "e", "f"]);
    }
}
