//! End-to-end tests against a running deployment.
//!
//! These need the service, MongoDB and a gateway deployment up, so they are
//! ignored by default: `cargo test -- --ignored` with the stack running.

use std::time::Duration;

pub struct TestConfig {
    pub service_url: String,
    pub user_id: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            service_url: std::env::var("MERIDIAN_TEST_URL")
                .unwrap_or_else(|_| "http://localhost:8087".to_string()),
            user_id: "00000000-0000-0000-0000-000000000001".to_string(),
        }
    }
}

#[tokio::test]
#[ignore] // Requires running service
async fn test_health_reports_gateway_state() {
    let config = TestConfig::default();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", config.service_url))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "document-ingestion");
    assert!(body["storage_gateway"].is_string());
}

#[tokio::test]
#[ignore] // Requires running service
async fn test_upload_without_files_is_rejected() {
    let config = TestConfig::default();
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("category", "certificates");
    let response = client
        .post(format!(
            "{}/api/v1/ships/00000000-0000-0000-0000-000000000009/documents/upload",
            config.service_url
        ))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore] // Requires running service
async fn test_upload_to_unknown_ship_is_404() {
    let config = TestConfig::default();
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "files",
        reqwest::multipart::Part::bytes(b"%PDF-1.4 stub".to_vec())
            .file_name("stub.pdf")
            .mime_str("application/pdf")
            .unwrap(),
    );
    let response = client
        .post(format!(
            "{}/api/v1/ships/{}/documents/upload",
            config.service_url,
            uuid::Uuid::new_v4()
        ))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore] // Requires running service
async fn test_task_requires_user_header() {
    let config = TestConfig::default();
    let client = reqwest::Client::new();

    let response = client
        .post(format!(
            "{}/api/v1/ships/{}/upload-tasks",
            config.service_url,
            uuid::Uuid::new_v4()
        ))
        .json(&serde_json::json!({"total_files": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
#[ignore] // Requires running service
async fn test_task_lifecycle_status_is_owner_scoped() {
    let config = TestConfig::default();
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!(
            "{}/api/v1/ships/{}/upload-tasks",
            config.service_url,
            uuid::Uuid::new_v4()
        ))
        .header("X-User-Id", &config.user_id)
        .json(&serde_json::json!({"total_files": 1}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let task_id = created["task_id"].as_str().unwrap().to_string();

    // Owner sees the task.
    let status = client
        .get(format!(
            "{}/api/v1/upload-tasks/{}",
            config.service_url, task_id
        ))
        .header("X-User-Id", &config.user_id)
        .send()
        .await
        .unwrap();
    assert!(status.status().is_success());

    // A different user does not.
    let foreign = client
        .get(format!(
            "{}/api/v1/upload-tasks/{}",
            config.service_url, task_id
        ))
        .header("X-User-Id", uuid::Uuid::new_v4().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status().as_u16(), 403);
}
