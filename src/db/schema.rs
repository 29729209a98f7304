use anyhow::{Context, Result};
use rusqlite::Connection;

/// Release-group preferences seeded on first start, most wanted first
pub const DEFAULT_RELEASE_PATTERNS: [&str; 3] = [
    "(720p.*)[-.](DIMENSION|KILLERS|IMMERSE|2HD|FiHTV|DHD)",
    "(720p.*)[-.](ASAP)",
    "(.*)[-.](LOL|KILLERS|ASAP|2HD|FiHTV)",
];

/// Create all database tables if they don't exist
pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS shows (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            last INTEGER
        )",
        [],
    )
    .context("Failed to create shows table")?;

    // One row per downloaded episode; the title is the dedup key
    conn.execute(
        "CREATE TABLE IF NOT EXISTS episodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            show INTEGER NOT NULL,
            name TEXT NOT NULL UNIQUE,
            magnet TEXT NOT NULL,
            date INTEGER NOT NULL,
            FOREIGN KEY (show) REFERENCES shows(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("Failed to create episodes table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS mismatch (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            show INTEGER NOT NULL,
            date INTEGER NOT NULL,
            FOREIGN KEY (show) REFERENCES shows(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("Failed to create mismatch table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS mismatch_name ON mismatch (name)",
        [],
    )
    .context("Failed to create mismatch index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ignored (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            date INTEGER NOT NULL
        )",
        [],
    )
    .context("Failed to create ignored table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS release_patterns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            position INTEGER NOT NULL,
            pattern TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )
    .context("Failed to create release_patterns table")?;

    seed_default_patterns(conn)?;

    Ok(())
}

/// Seed the default release patterns if none exist
fn seed_default_patterns(conn: &Connection) -> Result<()> {
    let count: i32 = conn
        .query_row("SELECT COUNT(*) FROM release_patterns", [], |row| row.get(0))
        .context("Failed to count release patterns")?;

    if count > 0 {
        return Ok(());
    }

    tracing::info!("Seeding default release patterns...");

    for (position, pattern) in DEFAULT_RELEASE_PATTERNS.iter().enumerate() {
        conn.execute(
            "INSERT INTO release_patterns (position, pattern, enabled) VALUES (?1, ?2, 1)",
            rusqlite::params![position as i32, pattern],
        )
        .with_context(|| format!("Failed to insert default pattern: {}", pattern))?;
    }

    tracing::info!(
        "Seeded {} default release patterns",
        DEFAULT_RELEASE_PATTERNS.len()
    );

    Ok(())
}
