//! Disabled backend for read-only deployments.

use vigil_core::config::BackendMode;
use vigil_core::errors::VigilResult;
use vigil_core::models::{BackendStatus, SubmissionOutcome, SubmissionRequest};
use vigil_core::traits::SubmissionBackend;

/// Rejects every submission with an explicit signal.
#[derive(Debug, Default)]
pub struct DisabledBackend;

impl DisabledBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SubmissionBackend for DisabledBackend {
    fn submit(&self, _request: &SubmissionRequest) -> VigilResult<SubmissionOutcome> {
        tracing::debug!("submission rejected: backend disabled");
        Ok(SubmissionOutcome::rejected(
            "submission is disabled on this deployment",
        ))
    }

    fn health_check(&self) -> bool {
        false
    }

    fn status(&self) -> BackendStatus {
        BackendStatus {
            mode: BackendMode::Disabled,
            healthy: false,
            detail: serde_json::json!({}),
        }
    }
}
