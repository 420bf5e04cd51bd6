//! What a submission backend reports back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BackendMode;

/// Terminal status of a submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// The run row is committed; `run_id` is set.
    Completed,
    /// The task is durably enqueued; `task_id` and `eta` are set.
    Accepted,
    /// Validation failure or disabled backend. Nothing was persisted.
    Rejected,
}

/// Result of `SubmissionBackend::submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    pub message: String,
    pub run_id: Option<i64>,
    pub task_id: Option<String>,
    pub eta: Option<DateTime<Utc>>,
}

impl SubmissionOutcome {
    pub fn completed(run_id: i64) -> Self {
        Self {
            status: SubmissionStatus::Completed,
            message: "health check run stored".to_string(),
            run_id: Some(run_id),
            task_id: None,
            eta: None,
        }
    }

    pub fn accepted(task_id: String, eta: DateTime<Utc>) -> Self {
        Self {
            status: SubmissionStatus::Accepted,
            message: "submission queued for processing".to_string(),
            run_id: None,
            task_id: Some(task_id),
            eta: Some(eta),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: SubmissionStatus::Rejected,
            message: message.into(),
            run_id: None,
            task_id: None,
            eta: None,
        }
    }
}

/// Structured status of the selected backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    pub mode: BackendMode,
    pub healthy: bool,
    /// Backend-specific detail (pool size, queue depth, ...).
    pub detail: serde_json::Value,
}
