//! Shared numeric constants used across the workspace.

/// Default severity score for a critical issue that carries no score of its own.
pub const DEFAULT_CRITICAL_SCORE: f64 = 9.0;

/// Default severity score for a high-priority issue without a score.
pub const DEFAULT_HIGH_SCORE: f64 = 7.0;

/// Default severity score for a medium-priority issue without a score.
pub const DEFAULT_MEDIUM_SCORE: f64 = 5.0;

/// Health-score penalty per critical issue when the analysis supplies no score.
pub const HEALTH_PENALTY_CRITICAL: f64 = 15.0;

/// Health-score penalty per high-priority issue.
pub const HEALTH_PENALTY_HIGH: f64 = 8.0;

/// Health-score penalty per medium-priority issue.
pub const HEALTH_PENALTY_MEDIUM: f64 = 3.0;

/// Maximum health score.
pub const HEALTH_SCORE_MAX: f64 = 100.0;

/// Required length of the local AES-256-GCM key, in bytes.
pub const LOCAL_KEY_LEN: usize = 32;
