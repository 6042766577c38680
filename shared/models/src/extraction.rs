//! Extraction pipeline types.
//!
//! Output shapes shared between the type detector, the extraction router and
//! the AI field extractor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a PDF carries a usable text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfType {
    TextBased,
    ImageBased,
}

impl std::fmt::Display for PdfType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextBased => write!(f, "text_based"),
            Self::ImageBased => write!(f, "image_based"),
        }
    }
}

/// MIME family of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Image,
}

/// Which path produced the raw text.
///
/// Downstream consumers and tests branch on this tag, so the set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    /// Direct text-layer extraction from a text-based PDF.
    DirectTextExtraction,
    /// Text layer was empty or garbled; OCR chain took over.
    TextExtractionFallback,
    /// OCR path (local engine or remote Document-AI).
    EnhancedOcr,
    /// Local OCR merged with a remote Document-AI escalation.
    HybridOcrEnhanced,
}

impl ProcessingMethod {
    pub fn is_ocr(&self) -> bool {
        matches!(
            self,
            Self::TextExtractionFallback | Self::EnhancedOcr | Self::HybridOcrEnhanced
        )
    }
}

impl std::fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectTextExtraction => write!(f, "direct_text_extraction"),
            Self::TextExtractionFallback => write!(f, "text_extraction_fallback"),
            Self::EnhancedOcr => write!(f, "enhanced_ocr"),
            Self::HybridOcrEnhanced => write!(f, "hybrid_ocr_enhanced"),
        }
    }
}

/// Document family a file is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Certificates,
    AuditReport,
    ApprovalDocument,
    OtherDocuments,
}

impl DocumentCategory {
    /// Collection name for the family.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Certificates => "certificates",
            Self::AuditReport => "audit_reports",
            Self::ApprovalDocument => "approval_documents",
            Self::OtherDocuments => "other_documents",
        }
    }

    /// Drive folder label under the ship folder.
    pub fn folder_label(&self) -> &'static str {
        match self {
            Self::Certificates => "Certificates",
            Self::AuditReport => "ISM - ISPS - MLC/Audit Report",
            Self::ApprovalDocument => "Approval Documents",
            Self::OtherDocuments => "Other Documents",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "certificates" | "certificate" => Some(Self::Certificates),
            "audit_report" | "audit_reports" => Some(Self::AuditReport),
            "approval_document" | "approval_documents" => Some(Self::ApprovalDocument),
            "other_documents" | "other" => Some(Self::OtherDocuments),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Certificates => write!(f, "certificates"),
            Self::AuditReport => write!(f, "audit_report"),
            Self::ApprovalDocument => write!(f, "approval_document"),
            Self::OtherDocuments => write!(f, "other_documents"),
        }
    }
}

/// Field bag extracted by the AI step.
///
/// Fields default to empty strings rather than being an open-ended map, so
/// the identity validator and duplicate detector can match on them directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub ship_name: String,
    #[serde(default)]
    pub imo_number: String,
    #[serde(default)]
    pub cert_name: String,
    #[serde(default)]
    pub cert_type: String,
    #[serde(default)]
    pub cert_no: String,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub valid_date: String,
    #[serde(default)]
    pub issued_by: String,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.ship_name.is_empty()
            && self.imo_number.is_empty()
            && self.cert_name.is_empty()
            && self.cert_no.is_empty()
            && self.issue_date.is_empty()
            && self.valid_date.is_empty()
            && self.issued_by.is_empty()
    }
}

/// Combined output of the extraction router and the AI classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub pdf_type: PdfType,
    pub processing_method: ProcessingMethod,
    pub category: DocumentCategory,
    pub fields: ExtractedFields,
    pub confidence: f64,
    /// True when the AI step failed and the safe default was substituted.
    pub fallback: bool,
}

impl ExtractionResult {
    /// Safe default used when the AI provider times out or returns garbage.
    /// Ambiguous documents land in the low-priority bucket instead of being
    /// discarded.
    pub fn fallback(pdf_type: PdfType, processing_method: ProcessingMethod) -> Self {
        Self {
            pdf_type,
            processing_method,
            category: DocumentCategory::OtherDocuments,
            fields: ExtractedFields::default(),
            confidence: 0.0,
            fallback: true,
        }
    }
}

/// Outcome of the identity validation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Identity consistent with the target ship.
    Pass,
    /// IMO matched (or was absent) but the extracted ship name differs.
    /// Non-blocking; the note is carried on the created record.
    Annotate { note: String },
    /// Extracted IMO belongs to a different ship. Processing stops here.
    Block { message: String },
}

impl ValidationOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Block { .. })
    }
}

/// One existing certificate that matched the candidate exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub certificate_id: Uuid,
    pub cert_name: String,
    pub cert_no: String,
    /// Exact-match policy: always 100 when present.
    pub similarity: u8,
}

/// Result of the duplicate check for one candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub duplicates: Vec<DuplicateMatch>,
    pub has_issues: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_method_tags() {
        assert_eq!(ProcessingMethod::EnhancedOcr.to_string(), "enhanced_ocr");
        assert_eq!(
            ProcessingMethod::DirectTextExtraction.to_string(),
            "direct_text_extraction"
        );
        assert!(ProcessingMethod::HybridOcrEnhanced.is_ocr());
        assert!(!ProcessingMethod::DirectTextExtraction.is_ocr());
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            DocumentCategory::from_str("certificates"),
            Some(DocumentCategory::Certificates)
        );
        assert_eq!(
            DocumentCategory::from_str("Audit_Report"),
            Some(DocumentCategory::AuditReport)
        );
        assert_eq!(DocumentCategory::from_str("unknown"), None);
    }

    #[test]
    fn test_fallback_result_is_other_documents() {
        let result = ExtractionResult::fallback(PdfType::ImageBased, ProcessingMethod::EnhancedOcr);
        assert_eq!(result.category, DocumentCategory::OtherDocuments);
        assert!(result.fallback);
        assert!(result.fields.is_empty());
    }
}
