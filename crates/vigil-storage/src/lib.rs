//! # vigil-storage
//!
//! SQLite persistence for health-check runs. Issues statements against an
//! assumed schema (companies, health_check_runs, triggered_rules); the
//! schema's DDL and migrations belong to the host application.

pub mod pool;
pub mod queries;
pub mod repository;

pub use pool::WritePool;
pub use repository::RunRepository;

use vigil_core::errors::{StorageError, VigilError};

/// Map a rusqlite failure onto the storage error taxonomy.
///
/// Missing tables or columns mean the assumed schema is absent, which is a
/// permanent condition; everything else is treated as transient.
pub fn to_storage_err(message: String) -> VigilError {
    if message.contains("no such table") || message.contains("no such column") {
        VigilError::Storage(StorageError::SchemaMismatch { detail: message })
    } else {
        VigilError::Storage(StorageError::Sqlite { message })
    }
}
