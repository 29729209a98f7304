//! Decides whether a feed entry is worth acquiring

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use super::EpisodeEntry;
use crate::db::{self, models::Show};

/// Tracked shows by name, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct ShowRegistry {
    shows: HashMap<String, Show>,
}

impl ShowRegistry {
    pub fn new(shows: Vec<Show>) -> Self {
        let shows = shows
            .into_iter()
            .map(|show| (show.name.trim().to_string(), show))
            .collect();

        Self { shows }
    }

    pub fn get(&self, name: &str) -> Option<&Show> {
        self.shows.get(name.trim())
    }

    /// First category that names a tracked show, else the fallback name
    pub fn resolve(&self, categories: &[String], fallback: Option<&str>) -> Option<&Show> {
        categories
            .iter()
            .find_map(|category| self.get(category))
            .or_else(|| fallback.and_then(|name| self.get(name)))
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision<'r> {
    Proceed(&'r Show),
    Ignored,
    AlreadyProcessed,
}

/// Filters an entry against the registry and the history
///
/// Untracked entries are recorded as ignored; that is the only write the
/// gate makes. The history check runs before any network or filesystem work.
pub fn should_process<'r>(
    conn: &Connection,
    registry: &'r ShowRegistry,
    entry: &EpisodeEntry,
    show_override: Option<&str>,
) -> Result<GateDecision<'r>> {
    let Some(show) = registry.resolve(&entry.categories, show_override) else {
        tracing::info!("{} ... not on the list", entry.title);
        db::record_ignored(conn, &entry.title, db::now_timestamp())?;
        return Ok(GateDecision::Ignored);
    };

    if let Some(record) = db::find_by_title(conn, &entry.title)? {
        tracing::info!("{} ... already processed", entry.title);
        tracing::debug!("'{}' was downloaded at {}", entry.title, record.date);
        return Ok(GateDecision::AlreadyProcessed);
    }

    Ok(GateDecision::Proceed(show))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_database;
    use crate::db::shows::insert_show;

    fn show(id: u32, name: &str) -> Show {
        Show {
            id,
            name: name.to_string(),
            last: None,
        }
    }

    fn setup() -> (Connection, ShowRegistry) {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();

        let shows = vec![show(1, "Show A"), show(2, "Show C")];
        for s in &shows {
            insert_show(&conn, s).unwrap();
        }

        (conn, ShowRegistry::new(shows))
    }

    fn entry(title: &str, categories: &[&str]) -> EpisodeEntry {
        EpisodeEntry {
            title: title.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            content: String::new(),
        }
    }

    fn ignored_count(conn: &Connection) -> i32 {
        conn.query_row("SELECT COUNT(*) FROM ignored", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_resolve_first_tracked_category() {
        let (_, registry) = setup();

        let categories = vec!["Legendas".to_string(), "Show C".to_string(), "Show A".to_string()];
        assert_eq!(registry.resolve(&categories, None).unwrap().id, 2);
    }

    #[test]
    fn test_resolve_fallback_only_when_no_category_matches() {
        let (_, registry) = setup();

        let categories = vec!["Show A".to_string()];
        assert_eq!(registry.resolve(&categories, Some("Show C")).unwrap().id, 1);
        assert_eq!(registry.resolve(&[], Some(" Show C ")).unwrap().id, 2);
        assert!(registry.resolve(&[], Some("Show Z")).is_none());
    }

    #[test]
    fn test_tracked_entry_proceeds() {
        let (conn, registry) = setup();

        let decision = should_process(&conn, &registry, &entry("EpX", &["Show A"]), None).unwrap();
        assert_eq!(decision, GateDecision::Proceed(registry.get("Show A").unwrap()));
        assert_eq!(ignored_count(&conn), 0);
    }

    #[test]
    fn test_untracked_entry_ignored_and_recorded() {
        let (conn, registry) = setup();

        let decision = should_process(&conn, &registry, &entry("EpX", &["Show B"]), None).unwrap();
        assert_eq!(decision, GateDecision::Ignored);

        let name: String = conn
            .query_row("SELECT name FROM ignored", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "EpX");
    }

    #[test]
    fn test_override_not_in_registry_is_ignored() {
        let (conn, registry) = setup();

        let decision =
            should_process(&conn, &registry, &entry("EpX", &[]), Some("Show B")).unwrap();
        assert_eq!(decision, GateDecision::Ignored);
    }

    #[test]
    fn test_override_used_without_categories() {
        let (conn, registry) = setup();

        let decision =
            should_process(&conn, &registry, &entry("EpX", &[]), Some("Show A")).unwrap();
        assert_eq!(decision, GateDecision::Proceed(registry.get("Show A").unwrap()));
    }

    #[test]
    fn test_already_downloaded_title() {
        let (conn, registry) = setup();

        db::record_download(&conn, 1, "EpX", "magnet:?xt=1", 10, || Ok(())).unwrap();

        let decision = should_process(&conn, &registry, &entry("EpX", &["Show A"]), None).unwrap();
        assert_eq!(decision, GateDecision::AlreadyProcessed);
        assert_eq!(ignored_count(&conn), 0);
    }

    #[test]
    fn test_mismatched_title_is_gated_again() {
        let (conn, registry) = setup();

        db::record_mismatch(&conn, "EpX", 1, 10).unwrap();

        let decision = should_process(&conn, &registry, &entry("EpX", &["Show A"]), None).unwrap();
        assert_eq!(decision, GateDecision::Proceed(registry.get("Show A").unwrap()));
    }
}
