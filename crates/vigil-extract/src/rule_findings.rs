//! Normalizes the three severity-bucketed issue lists into flat
//! triggered-rule records.

use vigil_core::models::{AnalysisIssue, AnalysisResults, Severity, TriggeredRule};

/// Flatten analysis results into triggered-rule records.
///
/// Severity is fixed per bucket; an issue without its own score gets the
/// bucket default. Iteration order is bucket order then list order, which
/// fixes insert order only. May yield zero rows.
pub fn extract(results: &AnalysisResults) -> Vec<TriggeredRule> {
    let mut rules = Vec::with_capacity(
        results.critical_issues.len()
            + results.high_priority_issues.len()
            + results.medium_priority_issues.len(),
    );
    bucket(&results.critical_issues, Severity::Critical, &mut rules);
    bucket(&results.high_priority_issues, Severity::High, &mut rules);
    bucket(&results.medium_priority_issues, Severity::Medium, &mut rules);
    rules
}

fn bucket(issues: &[AnalysisIssue], severity: Severity, out: &mut Vec<TriggeredRule>) {
    for issue in issues {
        out.push(TriggeredRule {
            rule_config_name: issue.rule_config_name.clone(),
            metric: issue.metric.clone(),
            severity,
            severity_score: issue.analysis.score.unwrap_or_else(|| severity.default_score()),
            reasoning: issue.analysis.reasoning.clone(),
            recommendations: issue.analysis.recommendations.clone(),
            data: issue.data.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vigil_core::models::IssueAnalysis;

    fn issue(name: &str, score: Option<f64>) -> AnalysisIssue {
        AnalysisIssue {
            rule_config_name: name.to_string(),
            metric: Some("cache_hit_ratio".to_string()),
            analysis: IssueAnalysis {
                score,
                reasoning: "ratio below threshold".to_string(),
                recommendations: vec!["increase shared_buffers".to_string()],
            },
            data: json!({ "value": 0.62 }),
        }
    }

    #[test]
    fn buckets_fix_severity_and_preserve_order() {
        let results = AnalysisResults {
            critical_issues: vec![issue("crit_a", None), issue("crit_b", Some(9.8))],
            high_priority_issues: vec![issue("high_a", None)],
            medium_priority_issues: vec![issue("med_a", None)],
            health_score: None,
        };
        let rules = extract(&results);
        assert_eq!(rules.len(), 4);
        assert_eq!(
            rules.iter().map(|r| r.rule_config_name.as_str()).collect::<Vec<_>>(),
            vec!["crit_a", "crit_b", "high_a", "med_a"]
        );
        assert_eq!(rules[0].severity, Severity::Critical);
        assert_eq!(rules[2].severity, Severity::High);
        assert_eq!(rules[3].severity, Severity::Medium);
    }

    #[test]
    fn issue_score_overrides_bucket_default() {
        let results = AnalysisResults {
            critical_issues: vec![issue("scored", Some(9.8)), issue("unscored", None)],
            ..Default::default()
        };
        let rules = extract(&results);
        assert_eq!(rules[0].severity_score, 9.8);
        assert_eq!(rules[1].severity_score, Severity::Critical.default_score());
    }

    #[test]
    fn empty_results_yield_no_rules() {
        assert!(extract(&AnalysisResults::default()).is_empty());
    }
}
