//! Meridian Document Ingestion Service
//!
//! Multi-file certificate and document ingestion for the fleet: type
//! detection, OCR-backed extraction, AI classification, identity validation,
//! duplicate detection and background Drive uploads through the Apps Script
//! gateway.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use meridian_database::{
    create_mongo_client, get_database, CertificateRepository, ShipDocumentRepository,
    ShipRepository, UploadTaskRepository,
};
use meridian_models::{BackgroundUploadTask, DocumentCategory, IngestSummary, PendingFile};
use meridian_storage::{BackgroundRunner, DriveGatewayClient, StorageGateway};
use meridian_utils::{init_logging, AppConfig, ErrorResponse, MeridianError};

mod ai_client;
mod detector;
mod duplicates;
mod extraction;
mod orchestrator;
mod upload_tasks;
mod validator;

#[cfg(test)]
mod testutil;

use ai_client::AiFieldExtractor;
use orchestrator::{IngestionOrchestrator, UploadCandidate, UploadOptions};
use upload_tasks::TaskManager;

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<IngestionOrchestrator>,
    tasks: Arc<TaskManager>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    init_logging(&config.logging)?;
    info!("Starting Meridian Document Ingestion Service");

    let mongo = create_mongo_client(
        &config.database.mongodb_url,
        Duration::from_secs(config.database.connection_timeout_seconds),
    )
    .await?;
    let db = get_database(&mongo, &config.database.database_name);

    let gateway: Arc<dyn StorageGateway> =
        Arc::new(DriveGatewayClient::new(config.gateway.clone())?);
    let extractor = Arc::new(AiFieldExtractor::new(config.ai.clone())?);
    let runner = BackgroundRunner::new();

    let orchestrator = Arc::new(IngestionOrchestrator::new(
        Arc::new(ShipRepository::new(&db)),
        Arc::new(CertificateRepository::new(&db)),
        Arc::new(ShipDocumentRepository::new(&db)),
        gateway,
        extractor,
        runner.clone(),
        config.ocr.clone(),
        &config.gateway,
    ));
    let tasks = Arc::new(TaskManager::new(
        Arc::new(UploadTaskRepository::new(&db)),
        orchestrator.clone(),
        runner,
    ));

    let state = AppState {
        orchestrator,
        tasks,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/v1/ships/:ship_id/documents/upload",
            post(upload_documents),
        )
        .route("/api/v1/documents/:category/:id", delete(delete_document))
        .route("/api/v1/ships/:ship_id/upload-tasks", post(create_task))
        .route("/api/v1/upload-tasks/:task_id", get(task_status))
        .route("/api/v1/upload-tasks/:task_id/files", post(add_task_file))
        .route("/api/v1/upload-tasks/:task_id/cancel", post(cancel_task))
        .layer(DefaultBodyLimit::max(config.server.max_request_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Document Ingestion Service listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wrapper so `?` works in handlers.
struct ApiError(MeridianError);

impl From<MeridianError> for ApiError {
    fn from(error: MeridianError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let gateway = match state.orchestrator.gateway_health().await {
        Ok(()) => "reachable",
        Err(_) => "unreachable",
    };
    Json(serde_json::json!({
        "status": "healthy",
        "service": "document-ingestion",
        "version": env!("CARGO_PKG_VERSION"),
        "storage_gateway": gateway,
    }))
}

/// Multi-file upload. Files arrive as repeated `files` parts; optional text
/// parts: `category` forces the classification for the whole batch, `date`
/// and `note` are stored on created non-certificate records.
async fn upload_documents(
    State(state): State<AppState>,
    Path(ship_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<IngestSummary>, ApiError> {
    let mut files = Vec::new();
    let mut options = UploadOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MeridianError::validation("multipart", e.to_string()))?
    {
        match field.name() {
            Some("category") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| MeridianError::validation("category", e.to_string()))?;
                options.category = Some(DocumentCategory::from_str(&value).ok_or_else(|| {
                    MeridianError::validation("category", format!("unknown category {}", value))
                })?);
            }
            Some("date") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| MeridianError::validation("date", e.to_string()))?;
                options.date = Some(value).filter(|s| !s.trim().is_empty());
            }
            Some("note") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| MeridianError::validation("note", e.to_string()))?;
                options.note = Some(value).filter(|s| !s.trim().is_empty());
            }
            _ => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| MeridianError::validation("file", e.to_string()))?;
                files.push(UploadCandidate {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        }
    }

    if files.is_empty() {
        return Err(MeridianError::validation("files", "no files provided").into());
    }

    let summary = state
        .orchestrator
        .ingest_batch(ship_id, options, files)
        .await?;
    Ok(Json(summary))
}

async fn delete_document(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let category = DocumentCategory::from_str(&category).ok_or_else(|| {
        MeridianError::validation("category", format!("unknown category {}", category))
    })?;
    state.orchestrator.delete_document(category, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct CreateTaskRequest {
    total_files: usize,
}

async fn create_task(
    State(state): State<AppState>,
    Path(ship_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<BackgroundUploadTask>), ApiError> {
    let owner = user_id(&headers)?;
    let task = state
        .tasks
        .create(owner, ship_id, request.total_files)
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn add_task_file(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    headers: HeaderMap,
    Json(file): Json<PendingFile>,
) -> Result<Json<BackgroundUploadTask>, ApiError> {
    let owner = user_id(&headers)?;
    let task = state.tasks.add_file(task_id, owner, file).await?;
    Ok(Json(task))
}

async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<BackgroundUploadTask>, ApiError> {
    let owner = user_id(&headers)?;
    let task = state.tasks.status(task_id, owner).await?;
    Ok(Json(task))
}

async fn cancel_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<BackgroundUploadTask>, ApiError> {
    let owner = user_id(&headers)?;
    let task = state.tasks.cancel(task_id, owner).await?;
    Ok(Json(task))
}

/// Upstream gateway authenticates and injects the user id.
fn user_id(headers: &HeaderMap) -> Result<Uuid, MeridianError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| MeridianError::authorization("missing X-User-Id header"))?;
    Uuid::parse_str(raw).map_err(|_| MeridianError::authorization("malformed X-User-Id header"))
}
