//! Extraction Router
//!
//! Picks the text-extraction strategy for a detected file and runs the
//! fallback chain: direct text-layer extraction for text-based PDFs, local
//! Tesseract OCR for raster images, and the remote Document-AI processor
//! (proxied through the storage gateway) as the escalation path. Remote
//! failures degrade to empty text; nothing in here escapes to the caller as
//! an error.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::process::Command;

use meridian_models::{FileKind, PdfType, ProcessingMethod};
use meridian_storage::StorageGateway;
use meridian_utils::OcrConfig;

use crate::detector::DetectedType;

/// Raw text plus how it was obtained.
#[derive(Debug, Clone)]
pub struct RouterOutput {
    pub raw_text: String,
    pub processing_method: ProcessingMethod,
    pub confidence: f64,
}

/// Ordered strategies; tried in sequence until one yields usable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    DirectText,
    LocalOcr,
    RemoteDocumentAi,
}

pub struct ExtractionRouter {
    config: OcrConfig,
    gateway: Arc<dyn StorageGateway>,
}

impl ExtractionRouter {
    pub fn new(config: OcrConfig, gateway: Arc<dyn StorageGateway>) -> Self {
        Self { config, gateway }
    }

    /// Run the strategy chain for one file.
    pub async fn extract(
        &self,
        data: &[u8],
        detected: &DetectedType,
        content_type: &str,
    ) -> RouterOutput {
        let plan = Self::plan(detected);
        let mut best = RouterOutput {
            raw_text: String::new(),
            processing_method: initial_method(detected),
            confidence: 0.0,
        };

        for (index, strategy) in plan.iter().enumerate() {
            let attempt = match strategy {
                Strategy::DirectText => self.direct_text(data),
                Strategy::LocalOcr => self.local_ocr(data).await,
                Strategy::RemoteDocumentAi => self.remote_document_ai(data, content_type).await,
            };

            let (text, confidence) = match attempt {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(strategy = ?strategy, error = %e, "Extraction strategy failed");
                    continue;
                }
            };

            if confidence > best.confidence {
                best.raw_text = text;
                best.confidence = confidence;
                best.processing_method = method_for(detected, *strategy, index);
            }

            if best.confidence >= self.config.min_confidence {
                break;
            }
        }

        tracing::info!(
            method = %best.processing_method,
            confidence = best.confidence,
            chars = best.raw_text.len(),
            "Extraction routed"
        );
        best
    }

    fn plan(detected: &DetectedType) -> Vec<Strategy> {
        match (detected.kind, detected.pdf_type) {
            (FileKind::Pdf, PdfType::TextBased) => {
                vec![Strategy::DirectText, Strategy::RemoteDocumentAi]
            }
            // Tesseract does not read PDF containers; scanned PDFs go
            // straight to the remote processor.
            (FileKind::Pdf, PdfType::ImageBased) => vec![Strategy::RemoteDocumentAi],
            (FileKind::Image, _) => vec![Strategy::LocalOcr, Strategy::RemoteDocumentAi],
        }
    }

    fn direct_text(&self, data: &[u8]) -> Result<(String, f64)> {
        let text =
            pdf_extract::extract_text_from_mem(data).context("text-layer extraction failed")?;
        let confidence = text_confidence(&text);
        Ok((text, confidence))
    }

    /// Local OCR via the Tesseract CLI. The image is written to a temp file
    /// because the CLI does not accept stdin for all formats.
    async fn local_ocr(&self, data: &[u8]) -> Result<(String, f64)> {
        let mut tmp = tempfile::NamedTempFile::new().context("temp file for OCR")?;
        tmp.write_all(data).context("writing OCR input")?;

        let output = Command::new(&self.config.tesseract_cmd)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg("eng")
            .output()
            .await
            .context("tesseract invocation failed")?;

        if !output.status.success() {
            anyhow::bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        let confidence = text_confidence(&text);
        Ok((text, confidence))
    }

    async fn remote_document_ai(&self, data: &[u8], content_type: &str) -> Result<(String, f64)> {
        let text = self
            .gateway
            .process_document_ai(data, content_type)
            .await
            .context("Document-AI escalation failed")?;
        let confidence = text_confidence(&text);
        Ok((text, confidence))
    }
}

fn initial_method(detected: &DetectedType) -> ProcessingMethod {
    match detected.pdf_type {
        PdfType::TextBased => ProcessingMethod::DirectTextExtraction,
        PdfType::ImageBased => ProcessingMethod::EnhancedOcr,
    }
}

/// Tag the winning strategy so downstream consumers can tell the paths apart.
fn method_for(detected: &DetectedType, strategy: Strategy, index: usize) -> ProcessingMethod {
    match (detected.pdf_type, strategy) {
        (PdfType::TextBased, Strategy::DirectText) => ProcessingMethod::DirectTextExtraction,
        // A text-based PDF that needed the OCR chain anyway.
        (PdfType::TextBased, _) => ProcessingMethod::TextExtractionFallback,
        (PdfType::ImageBased, Strategy::RemoteDocumentAi) if index > 0 => {
            // Local OCR ran first and the remote escalation improved on it.
            ProcessingMethod::HybridOcrEnhanced
        }
        (PdfType::ImageBased, _) => ProcessingMethod::EnhancedOcr,
    }
}

/// Crude usability score for extracted text: word count and the share of
/// printable word characters. OCR noise scores low, clean prose scores high.
fn text_confidence(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let words = trimmed.split_whitespace().count();
    let total_chars = trimmed.chars().count();
    let word_chars = trimmed
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ".,:-/()".contains(*c))
        .count();

    let char_quality = word_chars as f64 / total_chars as f64;
    let volume = (words as f64 / 20.0).min(1.0);
    char_quality * volume
}
