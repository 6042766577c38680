use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MeridianError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("AI provider error: {message}")]
    AiProvider { message: String },

    #[error("Storage gateway error: {message}")]
    StorageGateway { message: String },

    #[error("Authorization error: {message}")]
    Authorization { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl MeridianError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub fn ai_provider(message: impl Into<String>) -> Self {
        Self::AiProvider {
            message: message.into(),
        }
    }

    pub fn storage_gateway(message: impl Into<String>) -> Self {
        Self::StorageGateway {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Extraction { .. } => "EXTRACTION_ERROR",
            Self::AiProvider { .. } => "AI_PROVIDER_ERROR",
            Self::StorageGateway { .. } => "STORAGE_GATEWAY_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::RateLimit { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Database { .. } => 500,
            Self::Validation { .. } => 400,
            Self::Extraction { .. } => 422,
            Self::AiProvider { .. } => 502,
            Self::StorageGateway { .. } => 502,
            Self::Authorization { .. } => 403,
            Self::Configuration { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::RateLimit { .. } => 429,
            Self::Internal { .. } => 500,
        }
    }

    /// Transient errors are worth retrying with backoff; everything else
    /// is surfaced immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit { .. }) || {
            match self {
                Self::StorageGateway { message } | Self::AiProvider { message } => {
                    let lower = message.to_lowercase();
                    lower.contains("timeout")
                        || lower.contains("timed out")
                        || lower.contains("rate limit")
                        || lower.contains("503")
                        || lower.contains("502")
                        || lower.contains("500")
                }
                _ => false,
            }
        }
    }
}

pub type MeridianResult<T> = Result<T, MeridianError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<MeridianError> for ErrorResponse {
    fn from(error: MeridianError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

// Conversion from common error types
impl From<mongodb::error::Error> for MeridianError {
    fn from(error: mongodb::error::Error) -> Self {
        Self::database(error.to_string())
    }
}

impl From<reqwest::Error> for MeridianError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::storage_gateway(format!("timeout: {}", error))
        } else {
            Self::storage_gateway(error.to_string())
        }
    }
}

impl From<serde_json::Error> for MeridianError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_status() {
        let error = MeridianError::validation("imo", "mismatch");
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert_eq!(error.http_status_code(), 400);

        let error = MeridianError::rate_limit("Apps Script rate limit");
        assert_eq!(error.http_status_code(), 429);
        assert!(error.is_transient());
    }

    #[test]
    fn test_gateway_timeout_is_transient() {
        let error = MeridianError::storage_gateway("request timed out after 30s");
        assert!(error.is_transient());

        let error = MeridianError::storage_gateway("folder not found");
        assert!(!error.is_transient());
    }

    #[test]
    fn test_ai_provider_timeout_is_transient() {
        let error = MeridianError::ai_provider("timeout: operation timed out");
        assert!(error.is_transient());
        assert_eq!(error.http_status_code(), 502);

        let error = MeridianError::ai_provider("invalid api key");
        assert!(!error.is_transient());
    }
}
