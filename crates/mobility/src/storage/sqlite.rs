//! `SQLite`-backed key-value store.
//!
//! This is the durable backend: each key is one row in the `defaults` table,
//! its value the JSON encoding of a [`Value`]. Writes are committed before the
//! call returns.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::{migrations, KeyValueStore, Value};

/// Path reported for in-memory databases.
const MEMORY_PATH: &str = ":memory:";

/// A [`KeyValueStore`] persisted in a `SQLite` database.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a defaults database at the given path.
    ///
    /// Creates parent directories if needed and initializes the schema. When
    /// `wal` is set the database is switched to write-ahead logging.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>, wal: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening defaults database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::OpenDatabase {
            path: path.clone(),
            source,
        })?;

        if wal {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        }

        migrations::initialize_schema(&conn)?;

        info!("Defaults database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::OpenDatabase {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM defaults WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| Error::corrupt_entry(key, e.to_string()))
        })
        .transpose()
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            r"
            INSERT INTO defaults (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, json],
        )?;
        debug!("Persisted {} ({})", key, value.kind());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM defaults WHERE key = ?1", [key])?;
        if affected > 0 {
            debug!("Removed {}", key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM defaults ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::preferences::{PreferencesStore, RouteType};
    use crate::routes::{Route, RouteStore};

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    fn temp_db_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mobility_{tag}_{}.db", std::process::id()))
    }

    fn cleanup(path: &Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_in_memory() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), MEMORY_PATH);
    }

    #[test]
    fn test_set_and_get_every_kind() {
        let store = create_test_store();
        let values = [
            ("HighContrastMode", Value::Bool(true)),
            ("TextSize", Value::Int(2)),
            (
                "FrequentDestinations",
                Value::Strings(vec!["Work".to_string(), "Home".to_string()]),
            ),
            ("SavedRoutes", Value::Data(b"[]".to_vec())),
        ];

        for (key, value) in &values {
            store.set(key, value).unwrap();
        }
        for (key, value) in &values {
            assert_eq!(store.get(key).unwrap().as_ref(), Some(value));
        }
    }

    #[test]
    fn test_get_missing_key() {
        let store = create_test_store();
        assert!(store.get("TextSize").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let store = create_test_store();
        store.set("TextSize", &Value::Int(1)).unwrap();
        store.set("TextSize", &Value::Int(2)).unwrap();

        assert_eq!(store.get("TextSize").unwrap(), Some(Value::Int(2)));
        assert_eq!(store.keys().unwrap().len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = create_test_store();
        store.set("MuteVoiceGuidance", &Value::Bool(true)).unwrap();
        store.remove("MuteVoiceGuidance").unwrap();
        store.remove("MuteVoiceGuidance").unwrap();

        assert!(store.get("MuteVoiceGuidance").unwrap().is_none());
    }

    #[test]
    fn test_keys_sorted() {
        let store = create_test_store();
        store.set("TextSize", &Value::Int(0)).unwrap();
        store.set("AutoSaveRoutes", &Value::Bool(false)).unwrap();

        assert_eq!(
            store.keys().unwrap(),
            vec!["AutoSaveRoutes".to_string(), "TextSize".to_string()]
        );
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let store = create_test_store();
        store
            .conn
            .execute(
                "INSERT INTO defaults (key, value) VALUES ('TextSize', 'not json')",
                [],
            )
            .unwrap();

        let err = store.get("TextSize").unwrap_err();
        assert!(matches!(err, Error::CorruptEntry { .. }));
    }

    fn with_raw_rows(rows: &[(&str, &str)]) -> Arc<dyn KeyValueStore> {
        let store = create_test_store();
        for (key, value) in rows {
            store
                .conn
                .execute(
                    "INSERT INTO defaults (key, value) VALUES (?1, ?2)",
                    [key, value],
                )
                .unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_get_or_discard_hides_corrupt_row() {
        let backend = with_raw_rows(&[("TextSize", "{garbage")]);
        assert!(backend.get_or_discard("TextSize").unwrap().is_none());
        assert_eq!(backend.int_or("TextSize", 1).unwrap(), 1);
    }

    #[test]
    fn test_route_store_loads_empty_over_corrupt_row() {
        let backend = with_raw_rows(&[("SavedRoutes", "{garbage")]);

        let mut routes = RouteStore::load(Arc::clone(&backend)).unwrap();
        assert!(routes.is_empty());

        routes.save_route(Route::new("Library", "Gym")).unwrap();
        assert_eq!(RouteStore::load(backend).unwrap().len(), 1);
    }

    #[test]
    fn test_preferences_load_defaults_per_corrupt_field() {
        let backend = with_raw_rows(&[
            ("HapticFeedback", "xx"),
            ("PreferredRouteType", "{\"int\""),
            ("HighContrastMode", r#"{"bool":true}"#),
        ]);

        let prefs = PreferencesStore::load(backend).unwrap();
        assert!(!prefs.haptic_feedback());
        assert_eq!(prefs.preferred_route_type(), RouteType::Shortest);
        assert!(prefs.high_contrast_mode());
    }

    #[test]
    fn test_values_survive_reopen() {
        let path = temp_db_path("reopen");
        cleanup(&path);

        {
            let store = SqliteStore::open(&path, true).unwrap();
            store.set("TextSize", &Value::Int(2)).unwrap();
        }

        let store = SqliteStore::open(&path, true).unwrap();
        assert_eq!(store.get("TextSize").unwrap(), Some(Value::Int(2)));
        assert_eq!(store.path(), path);

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!("mobility_nested_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let nested = root.join("a/b/defaults.db");

        let store = SqliteStore::open(&nested, false).unwrap();
        assert!(nested.exists());

        drop(store);
        let _ = std::fs::remove_dir_all(&root);
    }
}
