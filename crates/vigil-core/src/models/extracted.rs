//! Output of cross-cutting metadata extraction over structured findings.

use serde::{Deserialize, Serialize};

/// Metadata pulled out of heterogeneous nested findings.
///
/// Every field is optional; absence of a source field is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    /// Raw version string as found, preserved even when unparsable.
    pub db_version: Option<String>,
    pub version_major: Option<i64>,
    pub version_minor: Option<i64>,
    pub cluster_name: Option<String>,
    pub node_count: Option<i64>,
    /// Opaque infrastructure key/value map.
    pub infra_tags: serde_json::Value,
}

impl ExtractedMetadata {
    pub fn empty() -> Self {
        Self {
            infra_tags: serde_json::Value::Object(serde_json::Map::new()),
            ..Default::default()
        }
    }
}
