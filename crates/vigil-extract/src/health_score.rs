//! Health-score resolution for a run.

use vigil_core::constants::{
    HEALTH_PENALTY_CRITICAL, HEALTH_PENALTY_HIGH, HEALTH_PENALTY_MEDIUM, HEALTH_SCORE_MAX,
};
use vigil_core::models::AnalysisResults;

/// The score the run is persisted with.
///
/// The analysis pipeline usually supplies one; when it does not, a
/// weighted issue-count fallback keeps the column populated so trend
/// queries never have to special-case missing scores.
pub fn resolve(results: &AnalysisResults) -> f64 {
    if let Some(score) = results.health_score {
        return score.clamp(0.0, HEALTH_SCORE_MAX);
    }
    let penalty = results.critical_issues.len() as f64 * HEALTH_PENALTY_CRITICAL
        + results.high_priority_issues.len() as f64 * HEALTH_PENALTY_HIGH
        + results.medium_priority_issues.len() as f64 * HEALTH_PENALTY_MEDIUM;
    (HEALTH_SCORE_MAX - penalty).clamp(0.0, HEALTH_SCORE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::models::{AnalysisIssue, IssueAnalysis};

    fn issue() -> AnalysisIssue {
        AnalysisIssue {
            rule_config_name: "r".to_string(),
            metric: None,
            analysis: IssueAnalysis::default(),
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn supplied_score_wins_and_is_clamped() {
        let mut results = AnalysisResults {
            health_score: Some(87.5),
            ..Default::default()
        };
        assert_eq!(resolve(&results), 87.5);
        results.health_score = Some(140.0);
        assert_eq!(resolve(&results), 100.0);
    }

    #[test]
    fn fallback_weighs_issue_counts() {
        let results = AnalysisResults {
            critical_issues: vec![issue()],
            high_priority_issues: vec![issue(), issue()],
            medium_priority_issues: vec![issue()],
            health_score: None,
        };
        // 100 - 15 - 2*8 - 3
        assert_eq!(resolve(&results), 66.0);
    }

    #[test]
    fn fallback_never_goes_negative() {
        let results = AnalysisResults {
            critical_issues: (0..10).map(|_| issue()).collect(),
            health_score: None,
            ..Default::default()
        };
        assert_eq!(resolve(&results), 0.0);
    }
}
