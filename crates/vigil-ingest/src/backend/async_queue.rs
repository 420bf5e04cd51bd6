//! Async-queue backend: durable enqueue now, insert later.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use vigil_core::config::{BackendMode, QueueConfig};
use vigil_core::errors::VigilResult;
use vigil_core::models::{BackendStatus, SubmissionOutcome, SubmissionRequest};
use vigil_core::traits::SubmissionBackend;

use crate::queue::broker::SqliteBroker;
use crate::queue::TaskStatus;

/// Serializes the request onto the durable broker and returns immediately.
///
/// The caller never learns the run id synchronously; it gets a task id and
/// an ETA, and the broker's status API tracks the rest. `accepted` is only
/// returned after the enqueue committed.
pub struct AsyncQueueBackend {
    broker: Arc<SqliteBroker>,
    eta_hint: Duration,
}

impl AsyncQueueBackend {
    pub fn new(broker: Arc<SqliteBroker>, cfg: &QueueConfig) -> Self {
        Self {
            broker,
            eta_hint: Duration::from_secs(cfg.worker_poll_interval_secs),
        }
    }

    /// Expose the broker's task status API to the submission surface.
    pub fn task_status(&self, task_id: &str) -> VigilResult<Option<TaskStatus>> {
        self.broker.task_status(task_id)
    }
}

impl SubmissionBackend for AsyncQueueBackend {
    fn submit(&self, request: &SubmissionRequest) -> VigilResult<SubmissionOutcome> {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "submission rejected before enqueue");
            return Ok(SubmissionOutcome::rejected(e.to_string()));
        }
        let task_id = self.broker.enqueue(request)?;
        let eta = Utc::now() + chrono::Duration::from_std(self.eta_hint).unwrap_or_default();
        Ok(SubmissionOutcome::accepted(task_id, eta))
    }

    fn health_check(&self) -> bool {
        self.broker.ping()
    }

    fn status(&self) -> BackendStatus {
        let depth = self.broker.depth().unwrap_or_default();
        BackendStatus {
            mode: BackendMode::AsyncQueue,
            healthy: self.health_check(),
            detail: serde_json::json!({
                "pending": depth.pending,
                "running": depth.running,
                "done": depth.done,
                "failed": depth.failed,
            }),
        }
    }
}
