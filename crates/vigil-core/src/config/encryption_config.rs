use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::run::EncryptionMode;

/// Encryption-at-rest settings. The mode is chosen per deployment, not per
/// request; the persisted mode tag keeps older rows readable after a switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    pub mode: EncryptionMode,
    /// Server-held AES-256-GCM key, base64 (32 bytes). Required for local
    /// mode and for reading local-mode history under kms mode.
    pub local_key_b64: Option<String>,
    pub kms: KmsConfig,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            mode: EncryptionMode::Local,
            local_key_b64: None,
            kms: KmsConfig::default(),
        }
    }
}

/// External key-management service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KmsConfig {
    pub endpoint: String,
    /// Master key identifier the service wraps data keys under.
    pub key_id: String,
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

impl Default for KmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key_id: String::new(),
            auth_token: None,
            timeout_secs: defaults::DEFAULT_KMS_TIMEOUT_SECS,
            cache_ttl_secs: defaults::DEFAULT_DATA_KEY_CACHE_TTL_SECS,
            cache_capacity: defaults::DEFAULT_DATA_KEY_CACHE_CAPACITY,
        }
    }
}
