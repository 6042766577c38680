//! Background upload task records and their state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// States of a multi-file background upload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadTaskState {
    /// Task created, no files received yet.
    Pending,
    /// Accepting file-add calls.
    Receiving,
    /// Worker is draining the pending queue.
    Processing,
    /// All received files processed.
    Completed,
    /// Cancelled by the owning user.
    Cancelled,
    /// Worker gave up.
    Failed,
}

impl UploadTaskState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, target: UploadTaskState) -> bool {
        use UploadTaskState::*;

        match (self, target) {
            (Pending, Receiving) => true,
            (Pending, Cancelled) => true,

            (Receiving, Processing) => true,
            (Receiving, Cancelled) => true,

            (Processing, Completed) => true,
            (Processing, Cancelled) => true,
            (Processing, Failed) => true,

            // Terminal states cannot transition
            (Completed, _) => false,
            (Cancelled, _) => false,
            (Failed, _) => false,

            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadTaskState::Completed | UploadTaskState::Cancelled | UploadTaskState::Failed
        )
    }
}

impl std::fmt::Display for UploadTaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Receiving => write!(f, "receiving"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One file buffered on a task until the worker picks it up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingFile {
    pub filename: String,
    pub content_type: String,
    /// Base64 payload; dropped once the file is processed.
    pub content_base64: String,
}

/// Tracks a multi-file folder upload across requests.
///
/// Owned exclusively by the creating user; every mutation is
/// authorization-checked against `owner_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundUploadTask {
    pub task_id: Uuid,
    pub owner_id: Uuid,
    pub ship_id: Uuid,
    pub state: UploadTaskState,
    pub total_files: usize,
    pub received_files: usize,
    pub processed_files: usize,
    pub pending: Vec<PendingFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BackgroundUploadTask {
    pub fn new(owner_id: Uuid, ship_id: Uuid, total_files: usize) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4(),
            owner_id,
            ship_id,
            state: UploadTaskState::Pending,
            total_files,
            received_files: 0,
            processed_files: 0,
            pending: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn all_received(&self) -> bool {
        self.received_files >= self.total_files
    }
}
