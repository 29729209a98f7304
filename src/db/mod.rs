pub mod history;
pub mod patterns;
pub mod schema;
pub mod shows;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// How long a write waits for a lock held by an overlapping invocation
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open the history database and make sure the schema exists
pub fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    conn.busy_timeout(BUSY_TIMEOUT)
        .context("Failed to set database busy timeout")?;

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    schema::init_database(&conn)?;

    Ok(conn)
}

/// Current time as stored in every history table
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

// Re-export commonly used types and functions
pub use history::{find_by_title, record_download, record_ignored, record_mismatch};
pub use patterns::get_release_patterns;
pub use shows::get_all_shows;

/// Data models for the database layer
pub mod models {
    use serde::{Deserialize, Serialize};

    /// A tracked show; its name is matched against feed categories
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Show {
        pub id: u32,
        pub name: String,
        /// Unix time of the last downloaded episode
        pub last: Option<i64>,
    }

    /// A downloaded episode
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct EpisodeRecord {
        pub id: u32,
        pub show_id: u32,
        pub name: String,
        pub magnet: String,
        pub date: i64,
    }

    /// A release-group preference pattern, lower position wins
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReleasePatternRow {
        pub id: u32,
        pub position: i32,
        pub pattern: String,
        pub enabled: bool,
    }
}
