//! Insert of the health-check run row.

use chrono::Utc;
use rusqlite::{params, Connection};

use vigil_core::errors::VigilResult;
use vigil_core::models::ExtractedMetadata;
use vigil_core::SubmissionRequest;
use vigil_crypto::EncryptedPayload;

use crate::to_storage_err;

/// Insert one run row and return its generated id.
///
/// The ciphertext, its mode tag and the wrapped data key are written
/// together; nothing ever updates them independently.
pub fn insert_run(
    conn: &Connection,
    req: &SubmissionRequest,
    company_id: i64,
    meta: &ExtractedMetadata,
    payload: &EncryptedPayload,
    health_score: f64,
) -> VigilResult<i64> {
    let target = &req.target_info;
    let cluster_name = target
        .cluster_name
        .as_deref()
        .or(meta.cluster_name.as_deref());
    let ai_metrics = req
        .ai_metrics
        .as_ref()
        .map(|v| v.to_string());

    conn.execute(
        "INSERT INTO health_check_runs (
            company_id, db_type, host, port, database_name, cluster_name,
            findings, encryption_mode, wrapped_data_key, adoc_content,
            submitted_by, submitted_from_host, collector_version,
            prompt_template, ai_metrics,
            db_version, version_major, version_minor, node_count, infra_tags,
            health_score, api_key_id, submitted_from_ip, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
        )",
        params![
            company_id,
            target.db_type,
            target.host,
            target.port,
            target.database,
            cluster_name,
            payload.ciphertext,
            payload.mode.as_tag(),
            payload.wrapped_data_key,
            req.adoc_content,
            req.submitted_by,
            req.submitted_from_host,
            req.collector_version,
            req.prompt_template,
            ai_metrics,
            meta.db_version,
            meta.version_major,
            meta.version_minor,
            meta.node_count,
            meta.infra_tags.to_string(),
            health_score,
            req.api_key_id,
            req.submitted_from_ip,
            Utc::now().to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(conn.last_insert_rowid())
}
