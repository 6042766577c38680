//! Apps Script Drive gateway client.
//!
//! The remote proxy speaks a JSON action protocol over HTTP POST. It is
//! treated as unreliable: bounded timeouts, bounded retry with backoff for
//! transient failures, and structured errors instead of panics on non-200
//! responses. Folder creation is never assumed atomic across retries, so
//! lookups always prefer "find" over blind "create".

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use meridian_utils::{GatewayConfig, MeridianError, MeridianResult};

/// Upload request for `upload_file_with_folder_creation`.
#[derive(Debug, Clone)]
pub struct GatewayUploadRequest {
    pub parent_folder_id: String,
    pub ship_name: String,
    /// Category path segment directly under the ship folder, e.g.
    /// "ISM - ISPS - MLC".
    pub parent_category: Option<String>,
    pub category: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Normalized upload outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayUpload {
    pub file_id: String,
    pub file_url: Option<String>,
}

/// Raw response envelope shared by every gateway action.
#[derive(Debug, Deserialize)]
struct GatewayResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    folder_id: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    subfolder_ids: Option<HashMap<String, String>>,
    /// Extracted text for `process_document_ai`.
    #[serde(default)]
    text: Option<String>,
}

/// Remote storage operations the pipeline depends on.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn ping(&self) -> MeridianResult<()>;

    async fn upload_with_folder_creation(
        &self,
        request: GatewayUploadRequest,
    ) -> MeridianResult<GatewayUpload>;

    /// Look up a subfolder by name under a parent, creating it only when
    /// absent. Calling twice with the same arguments returns the same id.
    async fn find_or_create_folder(
        &self,
        parent_folder_id: &str,
        folder_name: &str,
    ) -> MeridianResult<String>;

    async fn move_file(&self, file_id: &str, target_folder_id: &str) -> MeridianResult<()>;

    async fn delete_file(&self, file_id: &str) -> MeridianResult<()>;

    /// Remote Document-AI OCR escalation, proxied through the gateway.
    async fn process_document_ai(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> MeridianResult<String>;

    /// Translate a logical folder path ("Ship Name/ISM - ISPS - MLC/Audit
    /// Report") into a folder id, find-or-creating each segment in order.
    async fn ensure_folder_path(
        &self,
        root_folder_id: &str,
        path: &str,
    ) -> MeridianResult<String> {
        let mut parent = root_folder_id.to_string();
        for segment in path.split('/').filter(|s| !s.trim().is_empty()) {
            parent = self.find_or_create_folder(&parent, segment.trim()).await?;
        }
        Ok(parent)
    }
}

/// HTTP client for the Apps Script deployment.
#[derive(Clone)]
pub struct DriveGatewayClient {
    http: Client,
    config: GatewayConfig,
}

impl DriveGatewayClient {
    pub fn new(config: GatewayConfig) -> MeridianResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| MeridianError::internal(format!("HTTP client build failed: {}", e)))?;
        Ok(Self { http, config })
    }

    fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.config.control_timeout_seconds)
    }

    fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.config.transfer_timeout_seconds)
    }

    /// POST one action with bounded retries for transient failures.
    async fn post_action(
        &self,
        body: serde_json::Value,
        timeout: Duration,
    ) -> MeridianResult<GatewayResponse> {
        let action = body
            .get("action")
            .and_then(|a| a.as_str())
            .unwrap_or("unknown")
            .to_string();

        let mut last_error = MeridianError::storage_gateway("no attempts made");
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.retry_backoff_ms * (1 << (attempt - 1)) as u64;
                tokio::time::sleep(Duration::from_millis(backoff)).await;
                tracing::debug!(action = %action, attempt, "Retrying gateway action");
            }

            match self.try_post(&body, timeout).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    tracing::warn!(action = %action, attempt, error = %e, "Transient gateway error");
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error)
    }

    async fn try_post(
        &self,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> MeridianResult<GatewayResponse> {
        let response = self
            .http
            .post(&self.config.url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(MeridianError::rate_limit("Apps Script rate limit".to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MeridianError::storage_gateway(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let payload: GatewayResponse = response
            .json()
            .await
            .map_err(|e| MeridianError::storage_gateway(format!("malformed response: {}", e)))?;

        if !payload.success {
            let message = payload.message.unwrap_or_else(|| "unknown error".to_string());
            if message.to_lowercase().contains("rate limit") {
                return Err(MeridianError::rate_limit(message));
            }
            return Err(MeridianError::storage_gateway(message));
        }

        Ok(payload)
    }
}

#[async_trait]
impl StorageGateway for DriveGatewayClient {
    async fn ping(&self) -> MeridianResult<()> {
        self.post_action(json!({"action": "ping"}), self.control_timeout())
            .await?;
        Ok(())
    }

    async fn upload_with_folder_creation(
        &self,
        request: GatewayUploadRequest,
    ) -> MeridianResult<GatewayUpload> {
        let body = json!({
            "action": "upload_file_with_folder_creation",
            "parent_folder_id": request.parent_folder_id,
            "ship_name": request.ship_name,
            "parent_category": request.parent_category,
            "category": request.category,
            "filename": request.filename,
            "content_type": request.content_type,
            "file_content": BASE64.encode(&request.bytes),
        });

        let response = self.post_action(body, self.transfer_timeout()).await?;
        let file_id = response
            .file_id
            .ok_or_else(|| MeridianError::storage_gateway("upload returned no file_id"))?;
        Ok(GatewayUpload {
            file_id,
            file_url: response.file_url,
        })
    }

    async fn find_or_create_folder(
        &self,
        parent_folder_id: &str,
        folder_name: &str,
    ) -> MeridianResult<String> {
        // Find first. A blind create after a retried request would leave
        // duplicate folder names behind.
        let found = self
            .post_action(
                json!({
                    "action": "find_subfolder",
                    "parent_folder_id": parent_folder_id,
                    "folder_name": folder_name,
                }),
                self.control_timeout(),
            )
            .await;

        match found {
            Ok(response) => {
                if let Some(folder_id) = response.folder_id {
                    return Ok(folder_id);
                }
            }
            // "not found" comes back as success:false from some deployments
            Err(e) if !e.is_transient() => {}
            Err(e) => return Err(e),
        }

        let created = self
            .post_action(
                json!({
                    "action": "create_folder",
                    "parent_folder_id": parent_folder_id,
                    "folder_name": folder_name,
                }),
                self.control_timeout(),
            )
            .await?;

        created
            .folder_id
            .ok_or_else(|| MeridianError::storage_gateway("create_folder returned no folder_id"))
    }

    async fn move_file(&self, file_id: &str, target_folder_id: &str) -> MeridianResult<()> {
        self.post_action(
            json!({
                "action": "move_file",
                "file_id": file_id,
                "target_folder_id": target_folder_id,
            }),
            self.control_timeout(),
        )
        .await?;
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> MeridianResult<()> {
        self.post_action(
            json!({
                "action": "delete_file",
                "file_id": file_id,
            }),
            self.control_timeout(),
        )
        .await?;
        Ok(())
    }

    async fn process_document_ai(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> MeridianResult<String> {
        let response = self
            .post_action(
                json!({
                    "action": "process_document_ai",
                    "content_type": content_type,
                    "file_content": BASE64.encode(bytes),
                }),
                self.transfer_timeout(),
            )
            .await?;

        response
            .text
            .ok_or_else(|| MeridianError::storage_gateway("document AI returned no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Gateway stub tracking folder creation per (parent, name) pair.
    struct FolderStub {
        folders: Mutex<HashMap<(String, String), String>>,
        creates: AtomicUsize,
    }

    impl FolderStub {
        fn new() -> Self {
            Self {
                folders: Mutex::new(HashMap::new()),
                creates: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StorageGateway for FolderStub {
        async fn ping(&self) -> MeridianResult<()> {
            Ok(())
        }

        async fn upload_with_folder_creation(
            &self,
            _request: GatewayUploadRequest,
        ) -> MeridianResult<GatewayUpload> {
            unimplemented!()
        }

        async fn find_or_create_folder(
            &self,
            parent_folder_id: &str,
            folder_name: &str,
        ) -> MeridianResult<String> {
            let key = (parent_folder_id.to_string(), folder_name.to_string());
            let mut folders = self.folders.lock().unwrap();
            if let Some(id) = folders.get(&key) {
                return Ok(id.clone());
            }
            let n = self.creates.fetch_add(1, Ordering::SeqCst);
            let id = format!("folder-{}", n);
            folders.insert(key, id.clone());
            Ok(id)
        }

        async fn move_file(&self, _: &str, _: &str) -> MeridianResult<()> {
            Ok(())
        }

        async fn delete_file(&self, _: &str) -> MeridianResult<()> {
            Ok(())
        }

        async fn process_document_ai(&self, _: &[u8], _: &str) -> MeridianResult<String> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let stub = FolderStub::new();
        let first = stub.find_or_create_folder("root", "MV Ocean Star").await.unwrap();
        let second = stub.find_or_create_folder("root", "MV Ocean Star").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(stub.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_folder_path_walks_segments() {
        let stub = FolderStub::new();
        let leaf = stub
            .ensure_folder_path("root", "MV Ocean Star/ISM - ISPS - MLC/Audit Report")
            .await
            .unwrap();
        assert_eq!(stub.creates.load(Ordering::SeqCst), 3);

        // Same path resolves to the same leaf without new folders.
        let again = stub
            .ensure_folder_path("root", "MV Ocean Star/ISM - ISPS - MLC/Audit Report")
            .await
            .unwrap();
        assert_eq!(leaf, again);
        assert_eq!(stub.creates.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_ensure_folder_path_skips_empty_segments() {
        let stub = FolderStub::new();
        stub.ensure_folder_path("root", "/Certificates/").await.unwrap();
        assert_eq!(stub.creates.load(Ordering::SeqCst), 1);
    }
}
