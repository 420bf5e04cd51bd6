//! Direct backend: one synchronous insert on the calling thread.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use vigil_core::config::BackendMode;
use vigil_core::errors::VigilResult;
use vigil_core::models::{BackendStatus, SubmissionOutcome, SubmissionRequest};
use vigil_core::traits::SubmissionBackend;
use vigil_storage::pool::pragmas::apply_write_pragmas;
use vigil_storage::{to_storage_err, RunRepository};

/// Opens a fresh connection per call and blocks until the run transaction
/// commits. No retry; infrastructure failures propagate to the caller.
pub struct DirectBackend {
    db_path: PathBuf,
    repo: Arc<RunRepository>,
}

impl DirectBackend {
    pub fn new(db_path: PathBuf, repo: Arc<RunRepository>) -> Self {
        Self { db_path, repo }
    }

    fn open_connection(&self) -> VigilResult<Connection> {
        let conn =
            Connection::open(&self.db_path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_write_pragmas(&conn)?;
        Ok(conn)
    }
}

impl SubmissionBackend for DirectBackend {
    fn submit(&self, request: &SubmissionRequest) -> VigilResult<SubmissionOutcome> {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "submission rejected");
            return Ok(SubmissionOutcome::rejected(e.to_string()));
        }
        let conn = self.open_connection()?;
        let run_id = self.repo.insert(&conn, request)?;
        Ok(SubmissionOutcome::completed(run_id))
    }

    fn health_check(&self) -> bool {
        self.open_connection()
            .and_then(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(|e| to_storage_err(e.to_string()))
            })
            .is_ok()
    }

    fn status(&self) -> BackendStatus {
        BackendStatus {
            mode: BackendMode::Direct,
            healthy: self.health_check(),
            detail: serde_json::json!({
                "db_path": self.db_path.display().to_string(),
                "encryption_mode": self.repo.gateway().mode().as_tag(),
            }),
        }
    }
}
