//! Triggered rules: severity-flagged findings extracted from a run's
//! analysis results.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Severity bucket a triggered rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }

    /// Score used when the issue itself does not specify one.
    pub fn default_score(&self) -> f64 {
        match self {
            Severity::Critical => constants::DEFAULT_CRITICAL_SCORE,
            Severity::High => constants::DEFAULT_HIGH_SCORE,
            Severity::Medium => constants::DEFAULT_MEDIUM_SCORE,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flagged issue within a run.
///
/// Inserted in the same transaction as its parent run and never updated;
/// it is deleted only by deleting the run (cascade).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggeredRule {
    pub rule_config_name: String,
    pub metric: Option<String>,
    pub severity: Severity,
    pub severity_score: f64,
    pub reasoning: String,
    pub recommendations: Vec<String>,
    /// Raw triggering data snapshot.
    pub data: serde_json::Value,
}
