//! Triggered-rule rows for a run.

use rusqlite::{params, Connection};

use vigil_core::errors::VigilResult;
use vigil_core::models::{Severity, TriggeredRule};

use crate::to_storage_err;

/// Insert the triggered rules for a run. Returns how many rows landed.
///
/// The run record is the source of truth: a row that fails to insert is
/// logged and skipped, it never aborts the surrounding transaction.
/// Missing rows degrade analytics only.
pub fn insert_triggered_rules(conn: &Connection, run_id: i64, rules: &[TriggeredRule]) -> usize {
    let mut inserted = 0;
    for rule in rules {
        match insert_one(conn, run_id, rule) {
            Ok(()) => inserted += 1,
            Err(e) => {
                tracing::warn!(
                    run_id,
                    rule = %rule.rule_config_name,
                    error = %e,
                    "skipping triggered rule that failed to insert"
                );
            }
        }
    }
    inserted
}

fn insert_one(conn: &Connection, run_id: i64, rule: &TriggeredRule) -> VigilResult<()> {
    let recommendations = serde_json::to_string(&rule.recommendations)?;
    conn.execute(
        "INSERT INTO triggered_rules (
            run_id, rule_config_name, metric, severity, severity_score,
            reasoning, recommendations, data
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run_id,
            rule.rule_config_name,
            rule.metric,
            rule.severity.as_str(),
            rule.severity_score,
            rule.reasoning,
            recommendations,
            rule.data.to_string(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Load a run's triggered rules in insert order.
pub fn list_triggered_rules(conn: &Connection, run_id: i64) -> VigilResult<Vec<TriggeredRule>> {
    let mut stmt = conn
        .prepare(
            "SELECT rule_config_name, metric, severity, severity_score,
                    reasoning, recommendations, data
             FROM triggered_rules WHERE run_id = ?1 ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![run_id], |row| {
            let severity_tag: String = row.get(2)?;
            let recommendations_json: String = row.get(5)?;
            let data_json: String = row.get(6)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                severity_tag,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                recommendations_json,
                data_json,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rules = Vec::new();
    for row in rows {
        let (name, metric, severity_tag, score, reasoning, recs_json, data_json) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        let severity = parse_severity(&severity_tag)?;
        rules.push(TriggeredRule {
            rule_config_name: name,
            metric,
            severity,
            severity_score: score,
            reasoning,
            recommendations: serde_json::from_str(&recs_json)?,
            data: serde_json::from_str(&data_json)?,
        });
    }
    Ok(rules)
}

fn parse_severity(tag: &str) -> VigilResult<Severity> {
    match tag {
        "critical" => Ok(Severity::Critical),
        "high" => Ok(Severity::High),
        "medium" => Ok(Severity::Medium),
        other => Err(to_storage_err(format!("unknown severity '{other}'"))),
    }
}
