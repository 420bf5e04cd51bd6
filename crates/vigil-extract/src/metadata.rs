//! Metadata extraction from heterogeneous nested findings.
//!
//! Collector plugins for different database technologies nest the same
//! facts under different keys, so each fact is looked up across an ordered
//! candidate path list and the first non-empty match wins.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use vigil_core::models::ExtractedMetadata;

/// Candidate paths for the database version string, in priority order.
const VERSION_PATHS: &[&str] = &[
    "db_metadata.version",
    "db_version",
    "version_info.version",
    "server_info.version",
    "version",
];

const CLUSTER_PATHS: &[&str] = &[
    "db_metadata.cluster_name",
    "cluster_info.cluster_name",
    "cluster_info.name",
    "cluster_name",
];

const NODE_COUNT_PATHS: &[&str] = &[
    "cluster_info.node_count",
    "db_metadata.node_count",
    "node_count",
];

const INFRA_PATHS: &[&str] = &["infrastructure", "infra_metadata", "db_metadata.infrastructure"];

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)").expect("version regex"));

/// Extract cross-cutting metadata from structured findings.
pub fn extract(findings: &Value) -> ExtractedMetadata {
    let mut meta = ExtractedMetadata::empty();

    if let Some(version) = first_string(findings, VERSION_PATHS) {
        let (major, minor) = parse_major_minor(&version);
        meta.version_major = major;
        meta.version_minor = minor;
        meta.db_version = Some(version);
    }

    meta.cluster_name = first_string(findings, CLUSTER_PATHS);
    meta.node_count = first_integer(findings, NODE_COUNT_PATHS)
        .or_else(|| lookup(findings, "cluster_info.nodes").and_then(node_list_len));

    if let Some(tags) = INFRA_PATHS
        .iter()
        .find_map(|p| lookup(findings, p))
        .filter(|v| v.is_object())
    {
        meta.infra_tags = tags.clone();
    }

    meta
}

/// Parse `major.minor` out of a version string.
///
/// Unparsable strings yield `(None, None)`; the raw string is still kept
/// on the output record by [`extract`].
pub fn parse_major_minor(version: &str) -> (Option<i64>, Option<i64>) {
    match VERSION_RE.captures(version) {
        Some(caps) => {
            let major = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let minor = caps.get(2).and_then(|m| m.as_str().parse().ok());
            (major, minor)
        }
        None => (None, None),
    }
}

/// Walk a dot-separated path through nested JSON objects.
fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn first_string(root: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|p| {
        lookup(root, p)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn first_integer(root: &Value, paths: &[&str]) -> Option<i64> {
    paths.iter().find_map(|p| lookup(root, p).and_then(as_integer))
}

/// Collectors report counts as numbers or numeric strings.
fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn node_list_len(v: &Value) -> Option<i64> {
    v.as_array().map(|nodes| nodes.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_matching_path_wins() {
        let findings = json!({
            "db_version": "14.2",
            "db_metadata": { "version": "16.3" }
        });
        let meta = extract(&findings);
        assert_eq!(meta.db_version.as_deref(), Some("16.3"));
        assert_eq!(meta.version_major, Some(16));
        assert_eq!(meta.version_minor, Some(3));
    }

    #[test]
    fn unparsable_version_keeps_raw_string() {
        let meta = extract(&json!({ "db_version": "devel" }));
        assert_eq!(meta.db_version.as_deref(), Some("devel"));
        assert_eq!(meta.version_major, None);
        assert_eq!(meta.version_minor, None);
    }

    #[test]
    fn version_embedded_in_banner() {
        let (major, minor) = parse_major_minor("PostgreSQL 15.4 on x86_64");
        assert_eq!((major, minor), (Some(15), Some(4)));
    }

    #[test]
    fn node_count_falls_back_to_node_list() {
        let findings = json!({
            "cluster_info": { "nodes": [{"host": "a"}, {"host": "b"}, {"host": "c"}] }
        });
        assert_eq!(extract(&findings).node_count, Some(3));
    }

    #[test]
    fn node_count_accepts_numeric_string() {
        let findings = json!({ "node_count": "5" });
        assert_eq!(extract(&findings).node_count, Some(5));
    }

    #[test]
    fn absent_fields_are_not_an_error() {
        let meta = extract(&json!({}));
        assert_eq!(meta, ExtractedMetadata::empty());
    }

    #[test]
    fn infra_tags_must_be_an_object() {
        let meta = extract(&json!({ "infrastructure": "aws" }));
        assert!(meta.infra_tags.as_object().unwrap().is_empty());

        let meta = extract(&json!({ "infrastructure": { "cloud": "aws", "region": "eu-west-1" } }));
        assert_eq!(meta.infra_tags["cloud"], "aws");
    }
}
