//! AI Classification & Field Extractor
//!
//! Sends extracted text (or image bytes when no text is available) to an
//! OpenAI-compatible chat completion endpoint with a fixed schema prompt and
//! parses the structured reply. Provider timeouts, malformed JSON and
//! partial field sets all resolve to the safe default: category
//! `other_documents` with an empty field bag. Ambiguous documents land in a
//! low-priority bucket; they are never discarded and never raise.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use meridian_models::{
    DocumentCategory, ExtractedFields, ExtractionResult, PdfType, ProcessingMethod,
};
use meridian_utils::{AiConfig, MeridianError, MeridianResult};

/// Classification seam; the orchestrator and its tests depend on this, not
/// on the concrete HTTP client.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn classify_and_extract(
        &self,
        raw_text: &str,
        image: Option<&[u8]>,
        pdf_type: PdfType,
        processing_method: ProcessingMethod,
    ) -> ExtractionResult;
}

pub struct AiFieldExtractor {
    client: Client,
    config: AiConfig,
}

impl AiFieldExtractor {
    pub fn new(config: AiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    async fn request_completion(
        &self,
        raw_text: &str,
        image: Option<&[u8]>,
    ) -> MeridianResult<AiPayload> {
        let mut user_content = Vec::new();
        if let Some(image_data) = image {
            user_content.push(ChatContent::Image {
                image_url: ImageUrl {
                    url: format!("data:image/png;base64,{}", BASE64.encode(image_data)),
                },
            });
        }
        user_content.push(ChatContent::Text {
            text: if raw_text.trim().is_empty() {
                "Classify the attached document.".to_string()
            } else {
                format!("Document text:\n{}", raw_text)
            },
        });

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: vec![ChatContent::Text {
                        text: MARITIME_EXTRACTION_PROMPT.to_string(),
                    }],
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_content,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature, // Low temperature for consistent extraction
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MeridianError::ai_provider(format!("timeout: {}", e))
                } else {
                    MeridianError::ai_provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MeridianError::ai_provider(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| MeridianError::ai_provider(format!("malformed completion: {}", e)))?;
        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| MeridianError::ai_provider("no completion content"))?;

        parse_payload(content)
    }
}

#[async_trait]
impl FieldExtractor for AiFieldExtractor {
    async fn classify_and_extract(
        &self,
        raw_text: &str,
        image: Option<&[u8]>,
        pdf_type: PdfType,
        processing_method: ProcessingMethod,
    ) -> ExtractionResult {
        match self.request_completion(raw_text, image).await {
            Ok(payload) => {
                let category = DocumentCategory::from_str(&payload.category)
                    .unwrap_or(DocumentCategory::OtherDocuments);
                tracing::info!(
                    category = %category,
                    confidence = payload.confidence,
                    method = %processing_method,
                    "Document classified"
                );
                ExtractionResult {
                    pdf_type,
                    processing_method,
                    category,
                    fields: payload.fields,
                    confidence: payload.confidence,
                    fallback: false,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "AI extraction failed, using safe default");
                ExtractionResult::fallback(pdf_type, processing_method)
            }
        }
    }
}

/// Parsed provider reply; every field is optional on the wire.
#[derive(Debug, Deserialize)]
struct AiPayload {
    #[serde(default)]
    category: String,
    #[serde(flatten)]
    fields: ExtractedFields,
    #[serde(default)]
    confidence: f64,
}

/// Models wrap JSON in markdown fences more often than not.
fn parse_payload(content: &str) -> MeridianResult<AiPayload> {
    let trimmed = content.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(stripped)
        .map_err(|e| MeridianError::extraction(format!("malformed extraction JSON: {}", e)))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    Image { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

const MARITIME_EXTRACTION_PROMPT: &str = r#"
You are a maritime document extraction specialist. Classify the provided document and extract structured data.

Return a JSON object with the following structure:
{
  "category": "certificates" | "audit_report" | "approval_document" | "other_documents",
  "ship_name": "...",
  "imo_number": "digits only, empty if absent",
  "cert_name": "...",
  "cert_type": "...",
  "cert_no": "...",
  "issue_date": "YYYY-MM-DD",
  "valid_date": "YYYY-MM-DD",
  "issued_by": "issuing authority",
  "confidence": 0.0-1.0
}

Focus on:
1. The vessel identity (ship name, IMO number)
2. Certificate name, type and number (SMC, DOC, Load Line, Class, ISSC, MLC...)
3. Issue and expiry dates
4. The issuing authority or classification society

Use empty strings for anything the document does not state.
Return ONLY valid JSON, no additional text.
"#;
