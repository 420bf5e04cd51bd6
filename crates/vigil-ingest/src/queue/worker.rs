//! Worker that drains the broker and runs the same insert logic as the
//! synchronous backends.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rusqlite::Connection;

use vigil_core::config::QueueConfig;
use vigil_core::errors::VigilResult;
use vigil_storage::pool::pragmas::apply_write_pragmas;
use vigil_storage::{to_storage_err, RunRepository};

use super::broker::SqliteBroker;
use super::LeasedTask;

/// Exponent cap: beyond this the backoff is saturated anyway.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Drains leased tasks one at a time. Each attempt runs a fresh insert
/// transaction; no partial-commit state survives a failed attempt.
pub struct IngestWorker {
    broker: Arc<SqliteBroker>,
    repo: Arc<RunRepository>,
    db_path: PathBuf,
    max_retries: u32,
    retry_backoff_secs: u64,
    poll_interval: Duration,
}

impl IngestWorker {
    pub fn new(
        broker: Arc<SqliteBroker>,
        repo: Arc<RunRepository>,
        db_path: PathBuf,
        cfg: &QueueConfig,
    ) -> Self {
        Self {
            broker,
            repo,
            db_path,
            max_retries: cfg.max_retries,
            retry_backoff_secs: cfg.retry_backoff_secs,
            poll_interval: Duration::from_secs(cfg.worker_poll_interval_secs),
        }
    }

    /// Process at most one task. Returns whether a task was leased.
    pub fn run_once(&self) -> VigilResult<bool> {
        self.broker.recover_expired(Utc::now())?;
        let Some(task) = self.broker.lease_next(Utc::now())? else {
            return Ok(false);
        };

        match self.process(&task) {
            Ok(run_id) => {
                // Ack only after the insert transaction committed.
                self.broker.ack(&task.task_id)?;
                tracing::info!(task_id = %task.task_id, run_id, "queued submission stored");
            }
            Err(e) if e.is_retryable() && task.attempts < self.max_retries => {
                let delay = self.backoff_delay(task.attempts);
                let attempts = self.broker.retry(&task.task_id, delay, &e.to_string())?;
                tracing::warn!(
                    task_id = %task.task_id,
                    attempts,
                    delay_secs = delay,
                    error = %e,
                    "submission attempt failed, retry scheduled"
                );
            }
            Err(e) => {
                self.broker.fail(&task.task_id, &e.to_string())?;
                tracing::error!(
                    task_id = %task.task_id,
                    attempts = task.attempts,
                    retryable = e.is_retryable(),
                    error = %e,
                    "submission task failed permanently"
                );
            }
        }
        Ok(true)
    }

    /// Poll loop. Runs until the task is aborted by the host; the core
    /// exposes no cancellation of its own.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(db = %self.db_path.display(), "ingest worker started");
            loop {
                match self.run_once() {
                    Ok(true) => {}
                    Ok(false) => tokio::time::sleep(self.poll_interval).await,
                    Err(e) => {
                        tracing::error!(error = %e, "worker iteration failed");
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        })
    }

    /// `retry_backoff * 2^attempt`, saturating.
    fn backoff_delay(&self, attempts: u32) -> u64 {
        self.retry_backoff_secs
            .saturating_mul(1u64 << attempts.min(MAX_BACKOFF_SHIFT))
    }

    fn process(&self, task: &LeasedTask) -> VigilResult<i64> {
        task.request.validate()?;
        let conn = self.open_connection()?;
        self.repo.insert(&conn, &task.request)
    }

    fn open_connection(&self) -> VigilResult<Connection> {
        let conn =
            Connection::open(&self.db_path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_write_pragmas(&conn)?;
        Ok(conn)
    }
}
