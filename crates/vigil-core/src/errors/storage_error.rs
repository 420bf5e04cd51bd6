/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    /// The assumed relational schema is missing or incompatible. Permanent.
    #[error("schema mismatch: {detail}")]
    SchemaMismatch { detail: String },
}

impl StorageError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Sqlite { .. })
    }
}
