//! Backend selection at process start.
//!
//! The chosen backend is process-wide state with an explicit lifecycle:
//! built lazily on first access, guarded against concurrent double
//! initialization, alive until process exit. Closing pooled connections
//! and the broker at shutdown is the host application's job.

use std::sync::{Arc, OnceLock};

use vigil_core::config::BackendMode;
use vigil_core::errors::VigilResult;
use vigil_core::traits::SubmissionBackend;
use vigil_core::VigilConfig;
use vigil_crypto::EncryptionGateway;
use vigil_storage::RunRepository;

use crate::backend::{AsyncQueueBackend, DirectBackend, DisabledBackend, PooledBackend};
use crate::queue::broker::SqliteBroker;
use crate::queue::worker::IngestWorker;

static GLOBAL_BACKEND: OnceLock<Arc<dyn SubmissionBackend>> = OnceLock::new();

/// Build the backend named by the configuration.
pub fn build_backend(cfg: &VigilConfig) -> VigilResult<Arc<dyn SubmissionBackend>> {
    let gateway = Arc::new(EncryptionGateway::from_config(&cfg.encryption)?);
    build_backend_with_gateway(cfg, gateway)
}

/// Same as [`build_backend`] but with an injected gateway (tests pass a
/// mock KMS through here).
pub fn build_backend_with_gateway(
    cfg: &VigilConfig,
    gateway: Arc<EncryptionGateway>,
) -> VigilResult<Arc<dyn SubmissionBackend>> {
    let repo = Arc::new(RunRepository::new(gateway));
    let backend: Arc<dyn SubmissionBackend> = match cfg.backend {
        BackendMode::Direct => {
            Arc::new(DirectBackend::new(cfg.storage.db_path.clone(), repo))
        }
        BackendMode::Pooled => {
            Arc::new(PooledBackend::open(&cfg.storage.db_path, &cfg.pool, repo)?)
        }
        BackendMode::AsyncQueue => {
            let broker = Arc::new(SqliteBroker::open(
                &cfg.queue_db_path(),
                cfg.queue.task_lease_secs,
            )?);
            Arc::new(AsyncQueueBackend::new(broker, &cfg.queue))
        }
        BackendMode::Disabled => Arc::new(DisabledBackend::new()),
    };
    tracing::info!(mode = %cfg.backend, "submission backend ready");
    Ok(backend)
}

/// Get the process-wide backend, building it on first call.
///
/// Concurrent first calls may both build; exactly one instance wins and
/// the loser is dropped before anyone observes it.
pub fn init_global(cfg: &VigilConfig) -> VigilResult<Arc<dyn SubmissionBackend>> {
    if let Some(backend) = GLOBAL_BACKEND.get() {
        return Ok(Arc::clone(backend));
    }
    let built = build_backend(cfg)?;
    Ok(Arc::clone(GLOBAL_BACKEND.get_or_init(|| built)))
}

/// The already-initialized global backend, if any.
pub fn global() -> Option<Arc<dyn SubmissionBackend>> {
    GLOBAL_BACKEND.get().map(Arc::clone)
}

/// Build the worker that drains the async queue, sharing the same insert
/// logic and encryption configuration as the backends.
pub fn build_worker(cfg: &VigilConfig) -> VigilResult<IngestWorker> {
    let gateway = Arc::new(EncryptionGateway::from_config(&cfg.encryption)?);
    build_worker_with_gateway(cfg, gateway)
}

/// Worker construction with an injected gateway.
pub fn build_worker_with_gateway(
    cfg: &VigilConfig,
    gateway: Arc<EncryptionGateway>,
) -> VigilResult<IngestWorker> {
    let broker = Arc::new(SqliteBroker::open(
        &cfg.queue_db_path(),
        cfg.queue.task_lease_secs,
    )?);
    let repo = Arc::new(RunRepository::new(gateway));
    Ok(IngestWorker::new(
        broker,
        repo,
        cfg.storage.db_path.clone(),
        &cfg.queue,
    ))
}
