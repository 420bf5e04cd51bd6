//! # vigil-extract
//!
//! Deterministic, side-effect-free extraction over submission payloads:
//! target metadata from nested findings, triggered rules from the
//! severity-bucketed analysis results, and the health-score fallback.

pub mod health_score;
pub mod metadata;
pub mod rule_findings;
