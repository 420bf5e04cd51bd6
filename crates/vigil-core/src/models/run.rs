//! The persisted health-check run record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the findings payload was encrypted at rest.
///
/// Persisted next to the ciphertext so the read path is a dispatch on the
/// stored tag. The tag and the ciphertext are written together and never
/// independently mutated, which keeps mixed-mode history readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionMode {
    /// AEAD with a server-held key; ciphertext stored directly.
    Local,
    /// Envelope encryption: local data key, wrapped by an external KMS.
    Kms,
}

impl EncryptionMode {
    pub fn as_tag(&self) -> &'static str {
        match self {
            EncryptionMode::Local => "local",
            EncryptionMode::Kms => "kms",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "local" => Some(EncryptionMode::Local),
            "kms" => Some(EncryptionMode::Kms),
            _ => None,
        }
    }
}

impl std::fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// One ingested health-check submission.
///
/// Created exactly once per submission and immutable thereafter; the
/// reporting UI reads it, nothing in this core updates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckRun {
    pub id: i64,
    pub company_id: i64,
    pub db_type: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub cluster_name: Option<String>,
    /// Encrypted findings blob, base64. Decryptable only via the procedure
    /// named by `encryption_mode`.
    pub findings_ciphertext: String,
    pub encryption_mode: EncryptionMode,
    /// KMS-wrapped data key, present only for `EncryptionMode::Kms` rows.
    pub wrapped_data_key: Option<String>,
    pub adoc_content: String,
    pub submitted_by: Option<String>,
    pub submitted_from_host: Option<String>,
    pub collector_version: Option<String>,
    pub prompt_template: Option<String>,
    pub ai_metrics: Option<serde_json::Value>,
    pub db_version: Option<String>,
    pub version_major: Option<i64>,
    pub version_minor: Option<i64>,
    pub node_count: Option<i64>,
    /// Opaque infrastructure key/value map extracted from the findings.
    pub infra_tags: serde_json::Value,
    pub health_score: f64,
    pub api_key_id: Option<i64>,
    pub submitted_from_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}
