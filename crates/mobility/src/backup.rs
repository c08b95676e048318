//! Backup files.
//!
//! A backup file wraps a preferences [`Snapshot`] with the time it was
//! exported. Importing also accepts a bare snapshot object, so payloads
//! produced without the envelope still restore.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::preferences::{PreferencesStore, Snapshot};

/// Current backup file format version.
pub const BACKUP_VERSION: u32 = 1;

/// An exported preferences backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    /// File format version.
    pub version: u32,
    /// When the backup was taken.
    pub exported_at: DateTime<Utc>,
    /// The backed-up preference values.
    pub preferences: Snapshot,
}

impl BackupFile {
    /// Take a backup of `store` now.
    #[must_use]
    pub fn capture(store: &PreferencesStore) -> Self {
        Self {
            version: BACKUP_VERSION,
            exported_at: Utc::now(),
            preferences: store.backup(),
        }
    }

    /// Default file name for a backup taken at `at`.
    #[must_use]
    pub fn file_name(at: DateTime<Utc>) -> String {
        format!("preferences-{}.json", at.format("%Y%m%d-%H%M%S"))
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }

    /// Parse a backup, accepting either the envelope or a bare snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not an object, or if the envelope is
    /// from a newer format version.
    pub fn parse(json: &str) -> Result<Snapshot> {
        let raw: serde_json::Value = serde_json::from_str(json)?;

        if raw.get("preferences").is_some() && raw.get("exported_at").is_some() {
            let file: BackupFile = serde_json::from_value(raw)?;
            if file.version > BACKUP_VERSION {
                return Err(Error::invalid_input(
                    "backup",
                    format!(
                        "version {} is newer than supported version {BACKUP_VERSION}",
                        file.version
                    ),
                ));
            }
            return Ok(file.preferences);
        }

        match raw {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(Error::invalid_input(
                "backup",
                format!("expected a JSON object, found {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::preferences::TextSize;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn store() -> PreferencesStore {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        PreferencesStore::load(backend).unwrap()
    }

    #[test]
    fn test_capture_and_parse() {
        let mut prefs = store();
        prefs.set_text_size(TextSize::Medium).unwrap();

        let file = BackupFile::capture(&prefs);
        let json = file.to_json(true).unwrap();
        let snapshot = BackupFile::parse(&json).unwrap();

        assert_eq!(snapshot, prefs.backup());
        assert_eq!(file.version, BACKUP_VERSION);
    }

    #[test]
    fn test_parse_bare_snapshot() {
        let snapshot = BackupFile::parse(r#"{"TextSize": 1, "AutoSaveRoutes": true}"#).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["TextSize"], json!(1));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = BackupFile::parse("[1, 2, 3]").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(BackupFile::parse("not json").is_err());
    }

    #[test]
    fn test_parse_rejects_newer_version() {
        let json = json!({
            "version": BACKUP_VERSION + 1,
            "exported_at": "2024-11-26T10:00:00Z",
            "preferences": {}
        })
        .to_string();

        let err = BackupFile::parse(&json).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 11, 26, 9, 5, 3).unwrap();
        assert_eq!(BackupFile::file_name(at), "preferences-20241126-090503.json");
    }

    #[test]
    fn test_compact_json() {
        let json = BackupFile::capture(&store()).to_json(false).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"exported_at\""));
    }
}
