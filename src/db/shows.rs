use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::models::Show;

/// Get all shows from the database
pub fn get_all_shows(conn: &Connection) -> Result<Vec<Show>> {
    let mut stmt = conn
        .prepare("SELECT id, name, last FROM shows ORDER BY name")
        .context("Failed to prepare get_all_shows query")?;

    let shows = stmt
        .query_map([], |row| {
            Ok(Show {
                id: row.get(0)?,
                name: row.get(1)?,
                last: row.get(2)?,
            })
        })
        .context("Failed to execute get_all_shows query")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect shows")?;

    Ok(shows)
}

/// Get a single show by ID
#[cfg(test)]
pub(crate) fn get_show(conn: &Connection, id: u32) -> Result<Option<Show>> {
    use rusqlite::OptionalExtension;

    let show = conn
        .query_row(
            "SELECT id, name, last FROM shows WHERE id = ?1",
            [id],
            |row| {
                Ok(Show {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    last: row.get(2)?,
                })
            },
        )
        .optional()
        .context("Failed to execute get_show query")?;

    Ok(show)
}

/// Insert a new show into the database
///
/// Shows are managed directly in SQLite; the crate only reads them.
#[cfg(test)]
pub(crate) fn insert_show(conn: &Connection, show: &Show) -> Result<()> {
    conn.execute(
        "INSERT INTO shows (id, name, last) VALUES (?1, ?2, ?3)",
        params![show.id, show.name, show.last],
    )
    .context("Failed to insert show")?;

    Ok(())
}

/// Update the time a show last had an episode downloaded
pub fn update_last_seen(conn: &Connection, id: u32, time: i64) -> Result<()> {
    conn.execute("UPDATE shows SET last = ?2 WHERE id = ?1", params![id, time])
        .context("Failed to update show last seen")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_database;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        conn
    }

    fn show(id: u32, name: &str) -> Show {
        Show {
            id,
            name: name.to_string(),
            last: None,
        }
    }

    #[test]
    fn test_insert_and_get_show() {
        let conn = setup_test_db();

        insert_show(&conn, &show(12, "The Good Wife")).unwrap();

        let retrieved = get_show(&conn, 12).unwrap().unwrap();
        assert_eq!(retrieved.name, "The Good Wife");
        assert!(retrieved.last.is_none());
        assert!(get_show(&conn, 13).unwrap().is_none());
    }

    #[test]
    fn test_get_all_shows_sorted_by_name() {
        let conn = setup_test_db();

        insert_show(&conn, &show(1, "Suits")).unwrap();
        insert_show(&conn, &show(2, "Arrow")).unwrap();

        let shows = get_all_shows(&conn).unwrap();
        let names: Vec<&str> = shows.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Arrow", "Suits"]);
    }

    #[test]
    fn test_duplicate_show_name_rejected() {
        let conn = setup_test_db();

        insert_show(&conn, &show(1, "Suits")).unwrap();
        assert!(insert_show(&conn, &show(2, "Suits")).is_err());
    }

    #[test]
    fn test_update_last_seen() {
        let conn = setup_test_db();

        insert_show(&conn, &show(1, "Suits")).unwrap();
        update_last_seen(&conn, 1, 1_414_000_000).unwrap();

        let retrieved = get_show(&conn, 1).unwrap().unwrap();
        assert_eq!(retrieved.last, Some(1_414_000_000));
    }
}
