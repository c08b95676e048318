//! Schema versioning for the defaults database.
//!
//! The applied version is kept in the `metadata` table. Entry `n` of
//! [`MIGRATIONS`] takes the schema from version `n` to `n + 1` and runs in its
//! own transaction, so an interrupted upgrade never records a version whose
//! statements did not all apply.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema::{CREATE_DEFAULTS_TABLE, CREATE_METADATA_TABLE};

/// The schema version this build writes.
pub const CURRENT_VERSION: u32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Upgrade steps, oldest first.
const MIGRATIONS: &[&[&str]] = &[
    // 1: key/value rows
    &[CREATE_DEFAULTS_TABLE],
];

/// Bring the database up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if a statement fails, if the stored version is
/// unreadable, or if the database was written by a newer build.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let found = stored_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(Error::Schema(format!(
            "database schema version {found} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    for (version, statements) in (1..).zip(MIGRATIONS).skip(found as usize) {
        apply(conn, version, statements)?;
    }
    Ok(())
}

/// The recorded schema version; 0 for a database that has none yet.
fn stored_version(conn: &Connection) -> Result<u32> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        None => Ok(0),
        Some(text) => text.parse().map_err(|_| {
            Error::Schema(format!("stored schema version '{text}' is not a number"))
        }),
    }
}

fn apply(conn: &Connection, version: u32, statements: &[&str]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for sql in statements {
        tx.execute(sql, [])?;
    }
    tx.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (VERSION_KEY, version.to_string()),
    )?;
    tx.commit()?;

    debug!("Applied schema migration {}", version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    fn has_table(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |_| Ok(()),
        )
        .optional()
        .unwrap()
        .is_some()
    }

    #[test]
    fn test_every_version_has_a_migration() {
        assert_eq!(MIGRATIONS.len(), CURRENT_VERSION as usize);
    }

    #[test]
    fn test_fresh_database_is_upgraded() {
        let conn = fresh();
        initialize_schema(&conn).unwrap();

        assert!(has_table(&conn, "defaults"));
        assert!(has_table(&conn, "metadata"));
        assert_eq!(stored_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_reinitializing_keeps_rows() {
        let conn = fresh();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO defaults (key, value) VALUES ('TextSize', '{\"int\":2}')",
            [],
        )
        .unwrap();

        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM defaults", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unversioned_database_reads_as_zero() {
        let conn = fresh();
        conn.execute(CREATE_METADATA_TABLE, []).unwrap();
        assert_eq!(stored_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_newer_database_is_rejected() {
        let conn = fresh();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = ?1 WHERE key = ?2",
            ((CURRENT_VERSION + 1).to_string(), VERSION_KEY),
        )
        .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_garbage_version_is_reported() {
        let conn = fresh();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = 'abc' WHERE key = ?1",
            [VERSION_KEY],
        )
        .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("is not a number"));
        assert!(err.is_storage_error());
    }
}
