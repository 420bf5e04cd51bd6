use crate::errors::VigilResult;
use crate::models::{BackendStatus, SubmissionOutcome, SubmissionRequest};

/// One interchangeable ingestion strategy.
///
/// The factory selects a single implementation from configuration at
/// process start; the instance is shared across all requests for the
/// process lifetime. Implementations must only report `Completed` after
/// the run transaction committed, and `Accepted` only after the task is
/// durably enqueued.
pub trait SubmissionBackend: Send + Sync {
    /// Ingest one health-check submission.
    fn submit(&self, request: &SubmissionRequest) -> VigilResult<SubmissionOutcome>;

    /// Whether the backend can currently reach its underlying resources.
    fn health_check(&self) -> bool;

    /// Structured status for operational visibility.
    fn status(&self) -> BackendStatus;
}
