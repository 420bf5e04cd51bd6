//! Read-back of persisted runs, used by the reporting read path and tests.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use vigil_core::errors::VigilResult;
use vigil_core::models::{EncryptionMode, HealthCheckRun};

use crate::to_storage_err;

const RUN_COLUMNS: &str = "id, company_id, db_type, host, port, database_name, cluster_name,
    findings, encryption_mode, wrapped_data_key, adoc_content,
    submitted_by, submitted_from_host, collector_version, prompt_template, ai_metrics,
    db_version, version_major, version_minor, node_count, infra_tags,
    health_score, api_key_id, submitted_from_ip, created_at";

/// Fetch a single run by id.
pub fn get_run(conn: &Connection, id: i64) -> VigilResult<Option<HealthCheckRun>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {RUN_COLUMNS} FROM health_check_runs WHERE id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id], |row| Ok(row_to_run(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result {
        Some(run) => Ok(Some(run?)),
        None => Ok(None),
    }
}

/// Number of runs stored for a company.
pub fn count_runs_for_company(conn: &Connection, company_id: i64) -> VigilResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM health_check_runs WHERE company_id = ?1",
        params![company_id],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

fn row_to_run(row: &rusqlite::Row<'_>) -> VigilResult<HealthCheckRun> {
    let get_err = |e: rusqlite::Error| to_storage_err(e.to_string());

    let mode_tag: String = row.get(8).map_err(get_err)?;
    let encryption_mode = EncryptionMode::from_tag(&mode_tag)
        .ok_or_else(|| to_storage_err(format!("unknown encryption_mode '{mode_tag}'")))?;

    let infra_tags_json: String = row.get(20).map_err(get_err)?;
    let infra_tags = serde_json::from_str(&infra_tags_json)
        .map_err(|e| to_storage_err(format!("parse infra_tags: {e}")))?;

    let ai_metrics_json: Option<String> = row.get(15).map_err(get_err)?;
    let ai_metrics = ai_metrics_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| to_storage_err(format!("parse ai_metrics: {e}")))?;

    let created_at_str: String = row.get(24).map_err(get_err)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse created_at '{created_at_str}': {e}")))?;

    Ok(HealthCheckRun {
        id: row.get(0).map_err(get_err)?,
        company_id: row.get(1).map_err(get_err)?,
        db_type: row.get(2).map_err(get_err)?,
        host: row.get(3).map_err(get_err)?,
        port: row.get(4).map_err(get_err)?,
        database: row.get(5).map_err(get_err)?,
        cluster_name: row.get(6).map_err(get_err)?,
        findings_ciphertext: row.get(7).map_err(get_err)?,
        encryption_mode,
        wrapped_data_key: row.get(9).map_err(get_err)?,
        adoc_content: row.get(10).map_err(get_err)?,
        submitted_by: row.get(11).map_err(get_err)?,
        submitted_from_host: row.get(12).map_err(get_err)?,
        collector_version: row.get(13).map_err(get_err)?,
        prompt_template: row.get(14).map_err(get_err)?,
        ai_metrics,
        db_version: row.get(16).map_err(get_err)?,
        version_major: row.get(17).map_err(get_err)?,
        version_minor: row.get(18).map_err(get_err)?,
        node_count: row.get(19).map_err(get_err)?,
        infra_tags,
        health_score: row.get(21).map_err(get_err)?,
        api_key_id: row.get(22).map_err(get_err)?,
        submitted_from_ip: row.get(23).map_err(get_err)?,
        created_at,
    })
}
