//! The transient unit of work passed into a submission backend.

use serde::{Deserialize, Serialize};

use crate::errors::{VigilError, VigilResult};

/// Where the health check ran: the database being examined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetInfo {
    pub company_name: String,
    pub db_type: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
}

/// Analysis verdict attached to a single issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueAnalysis {
    pub score: Option<f64>,
    pub reasoning: String,
    pub recommendations: Vec<String>,
}

/// One flagged issue inside a severity bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisIssue {
    pub rule_config_name: String,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub analysis: IssueAnalysis,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The three severity-bucketed issue lists plus an optional overall score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResults {
    pub critical_issues: Vec<AnalysisIssue>,
    pub high_priority_issues: Vec<AnalysisIssue>,
    pub medium_priority_issues: Vec<AnalysisIssue>,
    pub health_score: Option<f64>,
}

/// A health-check submission as produced by a collector plugin.
///
/// Not persisted as such: the backend turns it into a [`HealthCheckRun`]
/// row plus its triggered rules.
///
/// [`HealthCheckRun`]: crate::models::run::HealthCheckRun
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub target_info: TargetInfo,
    /// Serialized structured findings. This is what gets encrypted at rest.
    pub findings_json: String,
    #[serde(default)]
    pub structured_findings: serde_json::Value,
    /// Human-readable report text.
    #[serde(default)]
    pub adoc_content: String,
    #[serde(default)]
    pub analysis_results: AnalysisResults,
    #[serde(default)]
    pub api_key_id: Option<i64>,
    #[serde(default)]
    pub submitted_from_ip: Option<String>,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub submitted_from_host: Option<String>,
    #[serde(default)]
    pub collector_version: Option<String>,
    #[serde(default)]
    pub prompt_template: Option<String>,
    #[serde(default)]
    pub ai_metrics: Option<serde_json::Value>,
}

impl SubmissionRequest {
    /// Validate the request before any side effect.
    ///
    /// Failures here are rejected synchronously by every backend and are
    /// never enqueued or retried.
    pub fn validate(&self) -> VigilResult<()> {
        if self.target_info.company_name.trim().is_empty() {
            return Err(VigilError::validation(
                "target_info.company_name",
                "must not be empty",
            ));
        }
        if self.target_info.db_type.trim().is_empty() {
            return Err(VigilError::validation(
                "target_info.db_type",
                "must not be empty",
            ));
        }
        if self.findings_json.is_empty() {
            return Err(VigilError::validation("findings_json", "must not be empty"));
        }
        Ok(())
    }
}
