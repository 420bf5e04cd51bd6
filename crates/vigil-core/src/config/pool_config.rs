use serde::{Deserialize, Serialize};

use super::defaults;

/// Bounds for the pooled backend's write-connection pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Connections opened eagerly when the pool starts.
    pub min_size: usize,
    /// Hard upper bound; callers beyond capacity block until a slot frees.
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: defaults::DEFAULT_POOL_MIN,
            max_size: defaults::DEFAULT_POOL_MAX,
        }
    }
}
