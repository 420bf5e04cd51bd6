//! Company resolution. Companies are created lazily from submissions.

use rusqlite::{params, Connection, OptionalExtension};

use vigil_core::errors::VigilResult;

use crate::to_storage_err;

/// Resolve a company id by name, creating the row on first sight.
///
/// Idempotent: the name column is unique, so concurrent submissions for a
/// new company converge on one row (`INSERT OR IGNORE` + re-select).
pub fn get_or_create_company(conn: &Connection, name: &str) -> VigilResult<i64> {
    if let Some(id) = find_company(conn, name)? {
        return Ok(id);
    }
    conn.execute(
        "INSERT OR IGNORE INTO companies (name) VALUES (?1)",
        params![name],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    find_company(conn, name)?.ok_or_else(|| {
        to_storage_err(format!("company '{name}' missing after insert"))
    })
}

fn find_company(conn: &Connection, name: &str) -> VigilResult<Option<i64>> {
    conn.query_row(
        "SELECT id FROM companies WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}
