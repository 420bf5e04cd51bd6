//! Pooled backend: same insert logic as direct, connections reused from a
//! bounded pool.

use std::path::Path;
use std::sync::Arc;

use vigil_core::config::{BackendMode, PoolConfig};
use vigil_core::errors::VigilResult;
use vigil_core::models::{BackendStatus, SubmissionOutcome, SubmissionRequest};
use vigil_core::traits::SubmissionBackend;
use vigil_storage::{to_storage_err, RunRepository, WritePool};

/// Borrows a connection per call. Checkout is closure-based, so the
/// connection returns to the pool on every exit path; callers beyond pool
/// capacity block until a slot frees.
pub struct PooledBackend {
    pool: WritePool,
    repo: Arc<RunRepository>,
}

impl PooledBackend {
    pub fn open(db_path: &Path, cfg: &PoolConfig, repo: Arc<RunRepository>) -> VigilResult<Self> {
        let pool = WritePool::open(db_path, cfg)?;
        tracing::info!(
            capacity = pool.capacity(),
            open = pool.open_connections(),
            "write pool ready"
        );
        Ok(Self { pool, repo })
    }

    pub fn pool(&self) -> &WritePool {
        &self.pool
    }
}

impl SubmissionBackend for PooledBackend {
    fn submit(&self, request: &SubmissionRequest) -> VigilResult<SubmissionOutcome> {
        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "submission rejected");
            return Ok(SubmissionOutcome::rejected(e.to_string()));
        }
        let run_id = self.pool.with_conn(|conn| self.repo.insert(conn, request))?;
        Ok(SubmissionOutcome::completed(run_id))
    }

    fn health_check(&self) -> bool {
        self.pool
            .with_conn(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(|e| to_storage_err(e.to_string()))
            })
            .is_ok()
    }

    fn status(&self) -> BackendStatus {
        BackendStatus {
            mode: BackendMode::Pooled,
            healthy: self.health_check(),
            detail: serde_json::json!({
                "pool_capacity": self.pool.capacity(),
                "open_connections": self.pool.open_connections(),
                "encryption_mode": self.repo.gateway().mode().as_tag(),
            }),
        }
    }
}
