//! # vigil-core
//!
//! Foundation crate for the Vigil health-check ingestion core.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{BackendMode, VigilConfig};
pub use errors::{VigilError, VigilResult};
pub use models::{
    AnalysisResults, BackendStatus, EncryptionMode, HealthCheckRun, SubmissionOutcome,
    SubmissionRequest, SubmissionStatus, TriggeredRule,
};
