use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Settings for the async-queue backend and its worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Location of the broker's task store. Defaults to a `-queue` sibling
    /// of the main database file when unset.
    pub db_path: Option<PathBuf>,
    pub max_retries: u32,
    /// Base of the exponential backoff: `retry_backoff * 2^attempt`.
    pub retry_backoff_secs: u64,
    pub worker_poll_interval_secs: u64,
    /// Lease per attempt; a crashed worker's task is redelivered after this.
    pub task_lease_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            retry_backoff_secs: defaults::DEFAULT_RETRY_BACKOFF_SECS,
            worker_poll_interval_secs: defaults::DEFAULT_WORKER_POLL_INTERVAL_SECS,
            task_lease_secs: defaults::DEFAULT_TASK_LEASE_SECS,
        }
    }
}
