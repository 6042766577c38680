//! Ingestion Orchestrator
//!
//! Drives one uploaded file through the full pipeline: type detection,
//! extraction routing, AI classification, identity validation, duplicate
//! detection, record creation and background upload scheduling. Files in a
//! batch are independent; one failure never aborts the others. The response
//! is returned once every record is committed, while the actual Drive
//! transfers run on the background worker.

use std::sync::Arc;

use uuid::Uuid;

use meridian_database::{CertificateStore, ShipDocumentStore, ShipStore};
use meridian_models::{
    Certificate, DocumentCategory, DocumentStatus, ExtractionResult, FileKind, FileResult,
    IngestStage, IngestSummary, Ship, ShipDocument, ValidationOutcome,
};
use meridian_storage::{BackgroundRunner, GatewayUploadRequest, StorageGateway};
use meridian_utils::validation::{is_valid_imo, issuer_abbreviation};
use meridian_utils::{GatewayConfig, MeridianError, MeridianResult, OcrConfig};

use crate::ai_client::FieldExtractor;
use crate::detector::TypeDetector;
use crate::duplicates::DuplicateDetector;
use crate::extraction::ExtractionRouter;
use crate::validator::IdentityValidator;

/// One file lifted out of the multipart request.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Request-level inputs that apply to every file in the batch.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Force this category for the whole batch.
    pub category: Option<DocumentCategory>,
    /// Caller-supplied document date, stored on non-certificate records.
    pub date: Option<String>,
    /// Caller-supplied note, stored on non-certificate records.
    pub note: Option<String>,
}

pub struct IngestionOrchestrator {
    ships: Arc<dyn ShipStore>,
    certificates: Arc<dyn CertificateStore>,
    documents: Arc<dyn ShipDocumentStore>,
    gateway: Arc<dyn StorageGateway>,
    extractor: Arc<dyn FieldExtractor>,
    detector: TypeDetector,
    router: ExtractionRouter,
    duplicates: DuplicateDetector,
    runner: BackgroundRunner,
    root_folder_id: String,
}

impl IngestionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ships: Arc<dyn ShipStore>,
        certificates: Arc<dyn CertificateStore>,
        documents: Arc<dyn ShipDocumentStore>,
        gateway: Arc<dyn StorageGateway>,
        extractor: Arc<dyn FieldExtractor>,
        runner: BackgroundRunner,
        ocr: OcrConfig,
        gateway_config: &GatewayConfig,
    ) -> Self {
        Self {
            ships,
            certificates: certificates.clone(),
            documents,
            gateway: gateway.clone(),
            extractor,
            detector: TypeDetector::new(ocr.min_chars_per_page),
            router: ExtractionRouter::new(ocr, gateway),
            duplicates: DuplicateDetector::new(certificates),
            runner,
            root_folder_id: gateway_config.root_folder_id.clone(),
        }
    }

    /// Ingest a batch of files for one ship. Per-file outcomes are collected
    /// into the summary; only a missing ship fails the whole request.
    pub async fn ingest_batch(
        &self,
        ship_id: Uuid,
        options: UploadOptions,
        files: Vec<UploadCandidate>,
    ) -> MeridianResult<IngestSummary> {
        let ship = self
            .ships
            .get(ship_id)
            .await
            .map_err(|e| MeridianError::database(e.to_string()))?
            .ok_or_else(|| MeridianError::not_found(format!("ship {}", ship_id)))?;

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let result = self.process_file(&ship, &options, file).await;
            results.push(result);
        }

        Ok(IngestSummary::from_results(results))
    }

    /// Run the pipeline for one file. Never returns an error; every failure
    /// mode maps to a terminal stage on the per-file result.
    async fn process_file(
        &self,
        ship: &Ship,
        options: &UploadOptions,
        file: UploadCandidate,
    ) -> FileResult {
        let mut result = FileResult::new(&file.filename);
        result.ship_name = ship.name.clone();

        // Detection is infallible: malformed input routes to OCR.
        let detected = self.detector.detect(&file.bytes, &file.content_type);
        advance(&mut result, IngestStage::Detected);

        let routed = self
            .router
            .extract(&file.bytes, &detected, &file.content_type)
            .await;
        advance(&mut result, IngestStage::Extracted);

        // Raster images go to the classifier as image payloads so the
        // multimodal provider can see what OCR could not read.
        let image = match detected.kind {
            FileKind::Image => Some(file.bytes.as_slice()),
            FileKind::Pdf => None,
        };
        let mut extraction = self
            .extractor
            .classify_and_extract(&routed.raw_text, image, detected.pdf_type, routed.processing_method)
            .await;
        extraction.fields.issued_by = issuer_abbreviation(&extraction.fields.issued_by);
        if !extraction.fields.imo_number.is_empty() && !is_valid_imo(&extraction.fields.imo_number)
        {
            // Extraction noise more often than a genuinely bad number.
            tracing::warn!(
                filename = %file.filename,
                imo = %extraction.fields.imo_number,
                "Extracted IMO number fails check-digit validation"
            );
        }
        result.extracted = Some(extraction.fields.clone());
        result.category = Some(extraction.category);

        if let Some(wanted) = options.category {
            if extraction.category != wanted && !extraction.fallback {
                advance(&mut result, IngestStage::Skipped);
                result.errors.push(format!(
                    "document classified as {} but {} was requested",
                    extraction.category, wanted
                ));
                return result;
            }
            extraction.category = wanted;
            result.category = Some(wanted);
        }

        let mut name_note = None;
        let outcome = IdentityValidator::validate(ship, &extraction.fields);
        advance(&mut result, IngestStage::Validated);
        match outcome {
            ValidationOutcome::Pass => {}
            ValidationOutcome::Annotate { note } => {
                result.note = Some(note.clone());
                name_note = Some(note);
            }
            ValidationOutcome::Block { message } => {
                advance(&mut result, IngestStage::Blocked);
                result.errors.push(message);
                return result;
            }
        }

        if extraction.category == DocumentCategory::Certificates {
            match self.duplicates.check(ship.id, &extraction.fields).await {
                Ok(check) => {
                    advance(&mut result, IngestStage::DuplicateChecked);
                    if check.has_issues {
                        let existing = &check.duplicates[0];
                        advance(&mut result, IngestStage::Skipped);
                        result.errors.push(format!(
                            "an identical certificate is already on file ({} / {})",
                            existing.cert_name, existing.cert_no
                        ));
                        return result;
                    }
                }
                Err(e) => {
                    advance(&mut result, IngestStage::Error);
                    result.errors.push(format!("duplicate check failed: {}", e));
                    return result;
                }
            }
        } else {
            // No duplicate policy outside certificates; the stage passes
            // vacuously.
            advance(&mut result, IngestStage::DuplicateChecked);
        }

        let record = match self
            .create_record(ship, &extraction, name_note.clone(), options, &file.filename)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                advance(&mut result, IngestStage::Error);
                result.errors.push(format!("record creation failed: {}", e));
                return result;
            }
        };
        advance(&mut result, IngestStage::RecordCreated);
        result.certificate_created = extraction.category == DocumentCategory::Certificates;

        // Resolve the target folder before scheduling the transfer. A dead
        // gateway surfaces here as a per-file error while the committed
        // record stays behind with file_id = null for reconciliation.
        let folder_path = format!("{}/{}", ship.name, extraction.category.folder_label());
        if let Err(e) = self
            .gateway
            .ensure_folder_path(&self.root_folder_id, &folder_path)
            .await
        {
            advance(&mut result, IngestStage::Error);
            result
                .errors
                .push(format!("storage gateway unavailable: {}", e));
            return result;
        }

        self.schedule_upload(ship, &extraction, record, file);
        advance(&mut result, IngestStage::UploadScheduled);
        // The transfer itself settles on the background worker; the file is
        // accepted once it is scheduled against a reachable gateway.
        result.google_drive_uploaded = true;
        advance(&mut result, IngestStage::Done);
        result
    }

    async fn create_record(
        &self,
        ship: &Ship,
        extraction: &ExtractionResult,
        name_note: Option<String>,
        options: &UploadOptions,
        filename: &str,
    ) -> anyhow::Result<RecordRef> {
        match extraction.category {
            DocumentCategory::Certificates => {
                let mut certificate = Certificate::from_extracted(ship.id, &extraction.fields);
                certificate.name_note = name_note;
                certificate.processing_method = Some(extraction.processing_method);
                let created = self.certificates.create(certificate).await?;
                Ok(RecordRef::Certificate(created.id))
            }
            category => {
                let title = if extraction.fields.cert_name.is_empty() {
                    filename.to_string()
                } else {
                    extraction.fields.cert_name.clone()
                };
                let mut document = ShipDocument::new(ship.id, title, category);
                document.name_note = name_note;
                document.date = options.date.clone();
                document.note = options.note.clone();
                let created = self.documents.create(document).await?;
                Ok(RecordRef::Document(category, created.id))
            }
        }
    }

    /// Hand the file and its generated summary to the background worker.
    /// The worker updates the record's file refs when the transfer settles.
    fn schedule_upload(
        &self,
        ship: &Ship,
        extraction: &ExtractionResult,
        record: RecordRef,
        file: UploadCandidate,
    ) {
        let gateway = self.gateway.clone();
        let certificates = self.certificates.clone();
        let documents = self.documents.clone();
        let root = self.root_folder_id.clone();
        let ship_name = ship.name.clone();
        let (parent_category, category_folder) = drive_folders(extraction.category);
        let summary = build_summary(&ship_name, extraction);
        let summary_filename = format!("{}.summary.txt", file.filename);

        self.runner.schedule(async move {
            let upload = gateway
                .upload_with_folder_creation(GatewayUploadRequest {
                    parent_folder_id: root.clone(),
                    ship_name: ship_name.clone(),
                    parent_category: parent_category.clone(),
                    category: category_folder.clone(),
                    filename: file.filename.clone(),
                    content_type: file.content_type.clone(),
                    bytes: file.bytes,
                })
                .await;

            let file_id = match upload {
                Ok(uploaded) => Some(uploaded.file_id),
                Err(e) => {
                    tracing::error!(filename = %file.filename, error = %e, "Drive upload failed");
                    None
                }
            };

            let summary_file_id = if file_id.is_some() {
                match gateway
                    .upload_with_folder_creation(GatewayUploadRequest {
                        parent_folder_id: root,
                        ship_name,
                        parent_category,
                        category: category_folder,
                        filename: summary_filename,
                        content_type: "text/plain".to_string(),
                        bytes: summary.into_bytes(),
                    })
                    .await
                {
                    Ok(uploaded) => Some(uploaded.file_id),
                    Err(e) => {
                        tracing::warn!(filename = %file.filename, error = %e, "Summary upload failed");
                        None
                    }
                }
            } else {
                None
            };

            let status = if file_id.is_some() {
                DocumentStatus::Active
            } else {
                DocumentStatus::UploadFailed
            };

            let update = match record {
                RecordRef::Certificate(id) => {
                    certificates
                        .set_file_refs(id, file_id, summary_file_id, status)
                        .await
                }
                RecordRef::Document(category, id) => {
                    documents
                        .set_file_refs(category, id, file_id, summary_file_id, status)
                        .await
                }
            };
            if let Err(e) = update {
                tracing::error!(error = %e, "Failed to record upload outcome");
            }
        });
    }

    /// Remove a document record and schedule deletion of its remote files.
    pub async fn delete_document(
        &self,
        category: DocumentCategory,
        id: Uuid,
    ) -> MeridianResult<()> {
        let (file_id, summary_file_id) = match category {
            DocumentCategory::Certificates => {
                let removed = self
                    .certificates
                    .delete(id)
                    .await
                    .map_err(|e| MeridianError::database(e.to_string()))?
                    .ok_or_else(|| MeridianError::not_found(format!("certificate {}", id)))?;
                (removed.file_id, removed.summary_file_id)
            }
            other => {
                let removed = self
                    .documents
                    .delete(other, id)
                    .await
                    .map_err(|e| MeridianError::database(e.to_string()))?
                    .ok_or_else(|| MeridianError::not_found(format!("document {}", id)))?;
                (removed.file_id, removed.summary_file_id)
            }
        };

        // Remote cleanup is best-effort; the record is already gone.
        for remote_id in [file_id, summary_file_id].into_iter().flatten() {
            let gateway = self.gateway.clone();
            self.runner.schedule(async move {
                if let Err(e) = gateway.delete_file(&remote_id).await {
                    tracing::warn!(file_id = %remote_id, error = %e, "Remote delete failed");
                }
            });
        }

        Ok(())
    }

    pub async fn gateway_health(&self) -> MeridianResult<()> {
        self.gateway.ping().await
    }
}

#[derive(Debug, Clone, Copy)]
enum RecordRef {
    Certificate(Uuid),
    Document(DocumentCategory, Uuid),
}

/// Move a file result to its next stage. Every pipeline status change goes
/// through here so an illegal transition fails loudly under test.
fn advance(result: &mut FileResult, stage: IngestStage) {
    debug_assert!(
        result.status.can_transition_to(stage),
        "illegal stage transition {} -> {}",
        result.status,
        stage
    );
    result.status = stage;
}

/// Split a category's folder label into the gateway's (parent, leaf) pair.
fn drive_folders(category: DocumentCategory) -> (Option<String>, String) {
    let label = category.folder_label();
    match label.split_once('/') {
        Some((parent, leaf)) => (Some(parent.to_string()), leaf.to_string()),
        None => (None, label.to_string()),
    }
}

/// Human-readable digest stored next to the original file.
fn build_summary(ship_name: &str, extraction: &ExtractionResult) -> String {
    let f = &extraction.fields;
    let mut lines = vec![
        format!("Ship: {}", ship_name),
        format!("Category: {}", extraction.category),
    ];
    if !f.imo_number.is_empty() {
        lines.push(format!("IMO: {}", f.imo_number));
    }
    if !f.cert_name.is_empty() {
        lines.push(format!("Document: {}", f.cert_name));
    }
    if !f.cert_type.is_empty() {
        lines.push(format!("Type: {}", f.cert_type));
    }
    if !f.cert_no.is_empty() {
        lines.push(format!("Number: {}", f.cert_no));
    }
    if !f.issue_date.is_empty() {
        lines.push(format!("Issued: {}", f.issue_date));
    }
    if !f.valid_date.is_empty() {
        lines.push(format!("Valid until: {}", f.valid_date));
    }
    if !f.issued_by.is_empty() {
        lines.push(format!("Issued by: {}", f.issued_by));
    }
    lines.push(format!(
        "Extraction: {} (confidence {:.2})",
        extraction.processing_method, extraction.confidence
    ));
    lines.join("\n")
}
