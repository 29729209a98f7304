use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::models::EpisodeRecord;
use super::shows::update_last_seen;

/// Look up a downloaded episode by its exact title
///
/// Only downloads count as history: mismatched titles are looked at again
/// on the next run and ignored ones once their show is tracked.
pub fn find_by_title(conn: &Connection, title: &str) -> Result<Option<EpisodeRecord>> {
    let record = conn
        .query_row(
            "SELECT id, show, name, magnet, date FROM episodes WHERE name = ?1",
            params![title],
            |row| {
                Ok(EpisodeRecord {
                    id: row.get(0)?,
                    show_id: row.get(1)?,
                    name: row.get(2)?,
                    magnet: row.get(3)?,
                    date: row.get(4)?,
                })
            },
        )
        .optional()
        .context("Failed to check episode history")?;

    Ok(record)
}

/// Record an entry whose show is not tracked
pub fn record_ignored(conn: &Connection, title: &str, time: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO ignored (name, date) VALUES (?1, ?2)",
        params![title, time],
    )
    .context("Failed to record ignored entry")?;

    Ok(())
}

/// Record an episode of a tracked show where no release matched
pub fn record_mismatch(conn: &Connection, title: &str, show_id: u32, time: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO mismatch (name, show, date) VALUES (?1, ?2, ?3)",
        params![title, show_id, time],
    )
    .context("Failed to record mismatch")?;

    Ok(())
}

/// Record a downloaded episode and bump the show's last seen time
///
/// Runs in one immediate transaction. `persist` runs once the title is
/// claimed and before the commit; if it fails nothing is recorded. Returns
/// `false` without calling `persist` when the title was already recorded,
/// which only happens when another invocation got there first.
pub fn record_download<F>(
    conn: &Connection,
    show_id: u32,
    title: &str,
    magnet: &str,
    time: i64,
    persist: F,
) -> Result<bool>
where
    F: FnOnce() -> Result<()>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .context("Failed to start download transaction")?;

    let inserted = tx
        .execute(
            "INSERT OR IGNORE INTO episodes (show, name, magnet, date) VALUES (?1, ?2, ?3, ?4)",
            params![show_id, title, magnet, time],
        )
        .context("Failed to record download")?;

    if inserted == 0 {
        // Dropping the transaction rolls it back
        return Ok(false);
    }

    persist()?;

    update_last_seen(&tx, show_id, time)?;

    tx.commit().context("Failed to commit download record")?;

    Ok(true)
}
