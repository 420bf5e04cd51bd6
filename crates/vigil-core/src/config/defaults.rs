//! Default values backing the config structs.

/// Connections opened eagerly by the write pool.
pub const DEFAULT_POOL_MIN: usize = 2;

/// Upper bound on write-pool connections.
pub const DEFAULT_POOL_MAX: usize = 8;

/// Retry attempts for a queued submission before it is marked failed.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base of the exponential retry backoff, in seconds.
pub const DEFAULT_RETRY_BACKOFF_SECS: u64 = 30;

/// How often an idle worker polls the broker, in seconds.
pub const DEFAULT_WORKER_POLL_INTERVAL_SECS: u64 = 5;

/// Lease granted to a worker per attempt; expired leases are redelivered.
pub const DEFAULT_TASK_LEASE_SECS: u64 = 300;

/// KMS request timeout, in seconds.
pub const DEFAULT_KMS_TIMEOUT_SECS: u64 = 10;

/// TTL of unwrapped data keys in the in-process cache, in seconds.
pub const DEFAULT_DATA_KEY_CACHE_TTL_SECS: u64 = 300;

/// Capacity of the data-key cache.
pub const DEFAULT_DATA_KEY_CACHE_CAPACITY: u64 = 1024;
