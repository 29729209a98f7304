//! Release pattern storage
//!
//! The release-group preference list is configuration: it lives in the
//! database so it can be tuned without a rebuild.

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::models::ReleasePatternRow;

/// Get all enabled release patterns in priority order
pub fn get_release_patterns(conn: &Connection) -> Result<Vec<ReleasePatternRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, position, pattern, enabled
             FROM release_patterns
             WHERE enabled = 1
             ORDER BY position ASC, id ASC",
        )
        .context("Failed to prepare get_release_patterns query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ReleasePatternRow {
                id: row.get(0)?,
                position: row.get(1)?,
                pattern: row.get(2)?,
                enabled: row.get::<_, i32>(3)? != 0,
            })
        })
        .context("Failed to execute get_release_patterns query")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect release patterns")?;

    Ok(rows)
}
