use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Fully resolved application configuration.
///
/// Resolved once at startup and threaded into components as a value; nothing
/// reads environment variables at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub gateway: GatewayConfig,
    pub ocr: OcrConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub mongodb_url: String,
    pub database_name: String,
    pub connection_timeout_seconds: u64,
}

/// LLM provider used for classification and field extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// Apps Script storage gateway endpoint and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: String,
    /// Root Drive folder under which ship folders are created.
    pub root_folder_id: String,
    /// Timeout for control calls (ping, folder lookup).
    pub control_timeout_seconds: u64,
    /// Timeout for file transfer calls.
    pub transfer_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

/// Local OCR engine and routing thresholds.
///
/// Thresholds are tunable operational parameters, not architectural
/// constants; defaults come from observed behavior on real certificates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub tesseract_cmd: String,
    /// Below this, local OCR output escalates to the remote Document-AI.
    pub min_confidence: f64,
    /// Text-layer density threshold separating text-based from image-based
    /// PDFs (extracted characters per page).
    pub min_chars_per_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Start with default values
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with MERIDIAN prefix
            .add_source(Environment::with_prefix("MERIDIAN").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8087,
                max_request_size: 32 * 1024 * 1024, // 32MB
                timeout_seconds: 30,
            },
            database: DatabaseConfig {
                mongodb_url: "mongodb://localhost:27017/meridian".to_string(),
                database_name: "meridian".to_string(),
                connection_timeout_seconds: 30,
            },
            ai: AiConfig {
                api_url: "https://api.openai.com/v1".to_string(),
                api_key: "your-api-key".to_string(),
                model: "gpt-4o".to_string(),
                max_tokens: 4096,
                temperature: 0.1,
                timeout_seconds: 60,
            },
            gateway: GatewayConfig {
                url: "https://script.google.com/macros/s/DEPLOYMENT_ID/exec".to_string(),
                root_folder_id: String::new(),
                control_timeout_seconds: 30,
                transfer_timeout_seconds: 120,
                max_retries: 3,
                retry_backoff_ms: 500,
            },
            ocr: OcrConfig {
                tesseract_cmd: "tesseract".to_string(),
                min_confidence: 0.6,
                min_chars_per_page: 100,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
