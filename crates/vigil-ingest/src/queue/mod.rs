//! Durable task queue for the async backend.
//!
//! The broker is a thin durable-queue primitive over its own SQLite table;
//! the domain schema stays untouched. Tasks are leased to workers and only
//! acknowledged after the run transaction commits (late ack), so a crashed
//! worker causes redelivery, never silent loss.

pub mod broker;
pub mod worker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_core::SubmissionRequest;

/// Lifecycle of a queued submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Done,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskState::Pending),
            "running" => Some(TaskState::Running),
            "done" => Some(TaskState::Done),
            "failed" => Some(TaskState::Failed),
            _ => None,
        }
    }
}

/// A task leased to a worker for one attempt.
#[derive(Debug)]
pub struct LeasedTask {
    pub task_id: String,
    pub request: SubmissionRequest,
    /// Completed attempts before this one.
    pub attempts: u32,
}

/// A task's externally visible state, served by the broker's status API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub state: TaskState,
    pub attempts: u32,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counts per state across the queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueDepth {
    pub pending: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}
