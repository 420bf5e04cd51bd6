//! Test support for the Vigil workspace: bootstrap DDL for the assumed
//! relational schema, canned submission builders, and a mock KMS.
//!
//! The production crates never create the domain schema; they issue
//! statements against tables assumed to exist. Tests bootstrap those
//! tables from here.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use base64::Engine;
use rusqlite::Connection;
use serde_json::json;

use vigil_core::errors::{CryptoError, VigilResult};
use vigil_core::models::{AnalysisIssue, AnalysisResults, IssueAnalysis, TargetInfo};
use vigil_core::traits::{DataKey, KmsClient};
use vigil_core::SubmissionRequest;

/// DDL for the assumed domain schema (companies, runs, triggered rules).
pub const INGEST_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS health_check_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    db_type TEXT NOT NULL,
    host TEXT,
    port INTEGER,
    database_name TEXT,
    cluster_name TEXT,
    findings TEXT NOT NULL,
    encryption_mode TEXT NOT NULL CHECK (encryption_mode IN ('local', 'kms')),
    wrapped_data_key TEXT,
    adoc_content TEXT NOT NULL DEFAULT '',
    submitted_by TEXT,
    submitted_from_host TEXT,
    collector_version TEXT,
    prompt_template TEXT,
    ai_metrics TEXT,
    db_version TEXT,
    version_major INTEGER,
    version_minor INTEGER,
    node_count INTEGER,
    infra_tags TEXT NOT NULL DEFAULT '{}',
    health_score REAL NOT NULL,
    api_key_id INTEGER,
    submitted_from_ip TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS triggered_rules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES health_check_runs(id) ON DELETE CASCADE,
    rule_config_name TEXT NOT NULL CHECK (length(rule_config_name) > 0),
    metric TEXT,
    severity TEXT NOT NULL CHECK (severity IN ('critical', 'high', 'medium')),
    severity_score REAL NOT NULL,
    reasoning TEXT NOT NULL DEFAULT '',
    recommendations TEXT NOT NULL DEFAULT '[]',
    data TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_runs_company ON health_check_runs(company_id, created_at);
CREATE INDEX IF NOT EXISTS idx_triggered_rules_run ON triggered_rules(run_id);
"#;

/// Create the assumed schema on a test connection.
pub fn apply_schema(conn: &Connection) {
    conn.execute_batch(INGEST_SCHEMA).expect("apply test schema");
}

/// Fixed 32-byte local key for tests, base64.
pub fn local_test_key_b64() -> String {
    base64::engine::general_purpose::STANDARD.encode([0x42u8; 32])
}

/// Structured findings for a three-node Postgres 16.3 cluster.
pub fn sample_structured_findings() -> serde_json::Value {
    json!({
        "db_metadata": {
            "version": "16.3",
            "cluster_name": "acme-prod"
        },
        "cluster_info": {
            "node_count": 3
        },
        "infrastructure": {
            "cloud": "aws",
            "region": "eu-central-1"
        },
        "settings": {
            "shared_buffers": "4GB",
            "max_connections": 400
        }
    })
}

/// One issue per severity bucket.
pub fn sample_analysis_results() -> AnalysisResults {
    let issue = |name: &str, metric: &str, score: Option<f64>| AnalysisIssue {
        rule_config_name: name.to_string(),
        metric: Some(metric.to_string()),
        analysis: IssueAnalysis {
            score,
            reasoning: format!("{metric} outside recommended range"),
            recommendations: vec![format!("tune {metric}")],
        },
        data: json!({ "metric": metric }),
    };
    AnalysisResults {
        critical_issues: vec![issue("connection_saturation", "max_connections", Some(9.5))],
        high_priority_issues: vec![issue("cache_hit_ratio_low", "cache_hit_ratio", None)],
        medium_priority_issues: vec![issue("idle_in_transaction", "idle_sessions", None)],
        health_score: Some(71.0),
    }
}

/// A complete valid submission for the given company.
pub fn sample_request(company: &str) -> SubmissionRequest {
    let findings = sample_structured_findings();
    SubmissionRequest {
        target_info: TargetInfo {
            company_name: company.to_string(),
            db_type: "postgres".to_string(),
            host: Some("db1.internal".to_string()),
            port: Some(5432),
            database: Some("orders".to_string()),
            cluster_name: None,
        },
        findings_json: findings.to_string(),
        structured_findings: findings,
        adoc_content: "= Health Check Report\n\nAll sections follow.".to_string(),
        analysis_results: sample_analysis_results(),
        api_key_id: Some(7),
        submitted_from_ip: Some("10.1.2.3".to_string()),
        submitted_by: Some("jdoe".to_string()),
        submitted_from_host: Some("bastion-01".to_string()),
        collector_version: Some("2.4.1".to_string()),
        prompt_template: None,
        ai_metrics: None,
    }
}

/// In-memory KMS double. Wraps keys by XOR with a fixed pad, so wrapped
/// tokens survive process restarts within a test. Can be switched into a
/// failing state to exercise `DecryptionUnavailable` paths.
pub struct MockKms {
    pad: u8,
    fail_decrypt: AtomicBool,
    fail_generate: AtomicBool,
    decrypt_calls: AtomicUsize,
}

impl Default for MockKms {
    fn default() -> Self {
        Self::new()
    }
}

impl MockKms {
    pub fn new() -> Self {
        Self {
            pad: 0x5a,
            fail_decrypt: AtomicBool::new(false),
            fail_generate: AtomicBool::new(false),
            decrypt_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_decrypt(&self, fail: bool) {
        self.fail_decrypt.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_generate(&self, fail: bool) {
        self.fail_generate.store(fail, Ordering::SeqCst);
    }

    /// Number of unwrap calls observed, for cache assertions.
    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }
}

impl KmsClient for MockKms {
    fn generate_data_key(&self) -> VigilResult<DataKey> {
        if self.fail_generate.load(Ordering::SeqCst) {
            return Err(CryptoError::KmsUnavailable {
                reason: "mock generate failure".to_string(),
            }
            .into());
        }
        let key = [0x17u8; 32];
        let wrapped: Vec<u8> = key.iter().map(|b| b ^ self.pad).collect();
        Ok(DataKey {
            plaintext: key.to_vec(),
            wrapped: base64::engine::general_purpose::STANDARD.encode(wrapped),
        })
    }

    fn decrypt_data_key(&self, wrapped: &str) -> VigilResult<Vec<u8>> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(CryptoError::DecryptionUnavailable {
                reason: "mock KMS timeout".to_string(),
            }
            .into());
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(wrapped)
            .map_err(|e| CryptoError::DecryptionUnavailable {
                reason: format!("mock unwrap: {e}"),
            })?;
        Ok(bytes.iter().map(|b| b ^ self.pad).collect())
    }

    fn name(&self) -> &str {
        "mock-kms"
    }

    fn is_available(&self) -> bool {
        !self.fail_decrypt.load(Ordering::SeqCst)
    }
}
