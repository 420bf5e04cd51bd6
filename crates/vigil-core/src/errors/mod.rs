//! Error types for the Vigil ingestion core.
//!
//! One enum per domain (storage, crypto, queue), wrapped by the top-level
//! [`VigilError`]. The worker uses [`VigilError::is_retryable`] to decide
//! between scheduling a retry and failing a task permanently.

mod crypto_error;
mod queue_error;
mod storage_error;

pub use crypto_error::CryptoError;
pub use queue_error::QueueError;
pub use storage_error::StorageError;

/// Top-level error for all Vigil operations.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// Malformed request. Rejected synchronously, never enqueued, never retried.
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Convenience alias used throughout the workspace.
pub type VigilResult<T> = Result<T, VigilError>;

impl VigilError {
    /// Whether the queue worker should schedule another attempt for this error.
    ///
    /// Transient infrastructure failures (connection refused, broker or KMS
    /// unavailable) are retryable. Validation failures, key misconfiguration
    /// and schema mismatches are permanent: retrying cannot help.
    pub fn is_retryable(&self) -> bool {
        match self {
            VigilError::Validation { .. }
            | VigilError::Config { .. }
            | VigilError::Serialization(_) => false,
            VigilError::Storage(e) => e.is_retryable(),
            VigilError::Crypto(e) => e.is_retryable(),
            VigilError::Queue(e) => e.is_retryable(),
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        VigilError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
