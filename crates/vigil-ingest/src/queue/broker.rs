//! SQLite-backed durable task broker.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use vigil_core::errors::{QueueError, VigilError, VigilResult};
use vigil_core::SubmissionRequest;

use super::{LeasedTask, QueueDepth, TaskState, TaskStatus};

/// The broker owns its task table; it is created on open.
const TASK_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ingest_tasks (
    task_id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    state TEXT NOT NULL DEFAULT 'pending',
    attempts INTEGER NOT NULL DEFAULT 0,
    next_attempt_at TEXT NOT NULL,
    lease_until TEXT,
    last_error TEXT,
    enqueued_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ingest_tasks_ready
    ON ingest_tasks(state, next_attempt_at);
";

fn broker_err(message: impl Into<String>) -> VigilError {
    QueueError::BrokerUnavailable {
        reason: message.into(),
    }
    .into()
}

/// Durable submission queue over a single SQLite file.
///
/// Producers enqueue serialized requests; workers lease the oldest ready
/// task, and the lease expires back to pending if the worker dies before
/// acknowledging.
pub struct SqliteBroker {
    conn: Mutex<Connection>,
    lease_secs: i64,
}

impl SqliteBroker {
    pub fn open(path: &Path, lease_secs: u64) -> VigilResult<Self> {
        let conn = Connection::open(path).map_err(|e| broker_err(e.to_string()))?;
        Self::initialize(conn, lease_secs)
    }

    /// In-memory broker for tests.
    pub fn open_in_memory(lease_secs: u64) -> VigilResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| broker_err(e.to_string()))?;
        Self::initialize(conn, lease_secs)
    }

    fn initialize(conn: Connection, lease_secs: u64) -> VigilResult<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| broker_err(e.to_string()))?;
        conn.execute_batch(TASK_SCHEMA)
            .map_err(|e| broker_err(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            lease_secs: lease_secs as i64,
        })
    }

    fn with_conn<F, T>(&self, f: F) -> VigilResult<T>
    where
        F: FnOnce(&Connection) -> VigilResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| broker_err(format!("broker lock poisoned: {e}")))?;
        f(&guard)
    }

    /// Durably enqueue a submission. Returns the task id once the insert
    /// committed; only then may the caller report `accepted`.
    pub fn enqueue(&self, request: &SubmissionRequest) -> VigilResult<String> {
        let task_id = uuid::Uuid::new_v4().to_string();
        let payload = serde_json::to_string(request)?;
        let now = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ingest_tasks
                    (task_id, payload, state, attempts, next_attempt_at, enqueued_at, updated_at)
                 VALUES (?1, ?2, 'pending', 0, ?3, ?3, ?3)",
                params![task_id, payload, now],
            )
            .map_err(|e| broker_err(e.to_string()))?;
            Ok(())
        })?;
        tracing::debug!(task_id = %task_id, "submission enqueued");
        Ok(task_id)
    }

    /// Lease the oldest ready task, marking it running until the lease
    /// deadline. Returns `None` when nothing is ready.
    pub fn lease_next(&self, now: DateTime<Utc>) -> VigilResult<Option<LeasedTask>> {
        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| broker_err(e.to_string()))?;

            let row: Option<(String, String, u32)> = tx
                .query_row(
                    "SELECT task_id, payload, attempts FROM ingest_tasks
                     WHERE state = 'pending' AND next_attempt_at <= ?1
                     ORDER BY next_attempt_at LIMIT 1",
                    params![now.to_rfc3339()],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
                )
                .optional()
                .map_err(|e| broker_err(e.to_string()))?;

            let Some((task_id, payload, attempts)) = row else {
                return Ok(None);
            };

            let lease_until = now + Duration::seconds(self.lease_secs);
            tx.execute(
                "UPDATE ingest_tasks
                 SET state = 'running', lease_until = ?2, updated_at = ?3
                 WHERE task_id = ?1",
                params![task_id, lease_until.to_rfc3339(), now.to_rfc3339()],
            )
            .map_err(|e| broker_err(e.to_string()))?;
            tx.commit().map_err(|e| broker_err(e.to_string()))?;

            let request: SubmissionRequest = serde_json::from_str(&payload)?;
            Ok(Some(LeasedTask {
                task_id,
                request,
                attempts,
            }))
        })
    }

    /// Late ack: called only after the run transaction committed.
    pub fn ack(&self, task_id: &str) -> VigilResult<()> {
        self.transition(task_id, TaskState::Done.as_str(), None)
    }

    /// Schedule another attempt after `delay_secs`. Returns the new
    /// attempt count.
    pub fn retry(&self, task_id: &str, delay_secs: u64, error: &str) -> VigilResult<u32> {
        let next = Utc::now() + Duration::seconds(delay_secs as i64);
        self.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE ingest_tasks
                     SET state = 'pending', attempts = attempts + 1, next_attempt_at = ?2,
                         lease_until = NULL, last_error = ?3, updated_at = ?4
                     WHERE task_id = ?1",
                    params![task_id, next.to_rfc3339(), error, Utc::now().to_rfc3339()],
                )
                .map_err(|e| broker_err(e.to_string()))?;
            if updated == 0 {
                return Err(QueueError::TaskNotFound {
                    task_id: task_id.to_string(),
                }
                .into());
            }
            conn.query_row(
                "SELECT attempts FROM ingest_tasks WHERE task_id = ?1",
                params![task_id],
                |r| r.get(0),
            )
            .map_err(|e| broker_err(e.to_string()))
        })
    }

    /// Mark a task failed for good. It stays visible via the status API.
    pub fn fail(&self, task_id: &str, error: &str) -> VigilResult<()> {
        self.transition(task_id, TaskState::Failed.as_str(), Some(error))
    }

    /// Return expired running leases to pending so a crashed worker's task
    /// is redelivered. Returns how many tasks were recovered.
    pub fn recover_expired(&self, now: DateTime<Utc>) -> VigilResult<usize> {
        self.with_conn(|conn| {
            let recovered = conn
                .execute(
                    "UPDATE ingest_tasks
                     SET state = 'pending', lease_until = NULL,
                         next_attempt_at = ?1, updated_at = ?1
                     WHERE state = 'running' AND lease_until < ?1",
                    params![now.to_rfc3339()],
                )
                .map_err(|e| broker_err(e.to_string()))?;
            if recovered > 0 {
                tracing::warn!(recovered, "requeued tasks with expired leases");
            }
            Ok(recovered)
        })
    }

    /// The queue's own status API.
    pub fn task_status(&self, task_id: &str) -> VigilResult<Option<TaskStatus>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT task_id, state, attempts, next_attempt_at, last_error,
                        enqueued_at, updated_at
                 FROM ingest_tasks WHERE task_id = ?1",
                params![task_id],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, u32>(2)?,
                        r.get::<_, Option<String>>(3)?,
                        r.get::<_, Option<String>>(4)?,
                        r.get::<_, String>(5)?,
                        r.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| broker_err(e.to_string()))?
            .map(
                |(task_id, state, attempts, next_attempt_at, last_error, enqueued_at, updated_at)| {
                    Ok(TaskStatus {
                        task_id,
                        state: TaskState::from_str(&state)
                            .ok_or_else(|| broker_err(format!("unknown task state '{state}'")))?,
                        attempts,
                        next_attempt_at: next_attempt_at.as_deref().map(parse_utc).transpose()?,
                        last_error,
                        enqueued_at: parse_utc(&enqueued_at)?,
                        updated_at: parse_utc(&updated_at)?,
                    })
                },
            )
            .transpose()
        })
    }

    /// Counts per state.
    pub fn depth(&self) -> VigilResult<QueueDepth> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT state, COUNT(*) FROM ingest_tasks GROUP BY state")
                .map_err(|e| broker_err(e.to_string()))?;
            let rows = stmt
                .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, usize>(1)?)))
                .map_err(|e| broker_err(e.to_string()))?;

            let mut depth = QueueDepth::default();
            for row in rows {
                let (state, count) = row.map_err(|e| broker_err(e.to_string()))?;
                match TaskState::from_str(&state) {
                    Some(TaskState::Pending) => depth.pending = count,
                    Some(TaskState::Running) => depth.running = count,
                    Some(TaskState::Done) => depth.done = count,
                    Some(TaskState::Failed) => depth.failed = count,
                    None => {}
                }
            }
            Ok(depth)
        })
    }

    /// Cheap reachability probe.
    pub fn ping(&self) -> bool {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| broker_err(e.to_string()))
        })
        .is_ok()
    }

    fn transition(&self, task_id: &str, state: &str, error: Option<&str>) -> VigilResult<()> {
        self.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE ingest_tasks
                     SET state = ?2, last_error = COALESCE(?3, last_error),
                         lease_until = NULL, updated_at = ?4
                     WHERE task_id = ?1",
                    params![task_id, state, error, Utc::now().to_rfc3339()],
                )
                .map_err(|e| broker_err(e.to_string()))?;
            if updated == 0 {
                return Err(QueueError::TaskNotFound {
                    task_id: task_id.to_string(),
                }
                .into());
            }
            Ok(())
        })
    }
}

fn parse_utc(s: &str) -> VigilResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| broker_err(format!("parse timestamp '{s}': {e}")))
}
