//! Configuration surface for the ingestion core.
//!
//! Deserialized once at process start; the backend factory reads
//! [`VigilConfig::backend`] to pick the submission strategy.

pub mod defaults;
mod encryption_config;
mod pool_config;
mod queue_config;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{VigilError, VigilResult};

pub use encryption_config::{EncryptionConfig, KmsConfig};
pub use pool_config::PoolConfig;
pub use queue_config::QueueConfig;

/// Which submission backend the factory instantiates at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    Direct,
    Pooled,
    AsyncQueue,
    Disabled,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BackendMode::Direct => "direct",
            BackendMode::Pooled => "pooled",
            BackendMode::AsyncQueue => "async_queue",
            BackendMode::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// Where the relational store lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

/// Top-level configuration for the ingestion core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub backend: BackendMode,
    pub storage: StorageConfig,
    pub pool: PoolConfig,
    pub queue: QueueConfig,
    pub encryption: EncryptionConfig,
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            backend: BackendMode::Direct,
            storage: StorageConfig::default(),
            pool: PoolConfig::default(),
            queue: QueueConfig::default(),
            encryption: EncryptionConfig::default(),
        }
    }
}

impl VigilConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> VigilResult<Self> {
        toml::from_str(s).map_err(|e| VigilError::Config {
            reason: format!("invalid config: {e}"),
        })
    }

    /// Load from a TOML file on disk.
    pub fn load(path: &Path) -> VigilResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| VigilError::Config {
            reason: format!("read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// The broker's task store location: explicit, or derived from the main
    /// database path.
    pub fn queue_db_path(&self) -> PathBuf {
        match &self.queue.db_path {
            Some(p) => p.clone(),
            None => {
                let mut p = self.storage.db_path.clone().into_os_string();
                p.push("-queue");
                PathBuf::from(p)
            }
        }
    }
}

// Re-exported so callers configuring encryption see one module.
pub use crate::models::run::EncryptionMode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_direct_local() {
        let cfg = VigilConfig::default();
        assert_eq!(cfg.backend, BackendMode::Direct);
        assert_eq!(cfg.encryption.mode, EncryptionMode::Local);
    }

    #[test]
    fn parses_full_toml() {
        let cfg = VigilConfig::from_toml_str(
            r#"
            backend = "async_queue"

            [storage]
            db_path = "/var/lib/vigil/vigil.db"

            [pool]
            min_size = 1
            max_size = 4

            [queue]
            max_retries = 5
            retry_backoff_secs = 10

            [encryption]
            mode = "kms"

            [encryption.kms]
            endpoint = "https://kms.internal"
            key_id = "alias/vigil"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.backend, BackendMode::AsyncQueue);
        assert_eq!(cfg.pool.max_size, 4);
        assert_eq!(cfg.queue.max_retries, 5);
        assert_eq!(cfg.encryption.mode, EncryptionMode::Kms);
        assert_eq!(cfg.encryption.kms.key_id, "alias/vigil");
    }

    #[test]
    fn queue_db_path_derives_from_storage() {
        let mut cfg = VigilConfig::default();
        cfg.storage.db_path = PathBuf::from("/tmp/vigil.db");
        assert_eq!(cfg.queue_db_path(), PathBuf::from("/tmp/vigil.db-queue"));
        cfg.queue.db_path = Some(PathBuf::from("/tmp/tasks.db"));
        assert_eq!(cfg.queue_db_path(), PathBuf::from("/tmp/tasks.db"));
    }

    #[test]
    fn rejects_unknown_backend_mode() {
        assert!(VigilConfig::from_toml_str("backend = \"celery\"").is_err());
    }
}
