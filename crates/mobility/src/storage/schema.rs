//! `SQLite` schema definitions for the defaults database.

/// Bookkeeping table; holds the schema version and nothing else today.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// One row per persisted key.
///
/// `value` holds the JSON encoding of a [`super::Value`].
pub const CREATE_DEFAULTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS defaults (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_created_idempotently() {
        for sql in [CREATE_METADATA_TABLE, CREATE_DEFAULTS_TABLE] {
            assert!(sql.contains("IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_defaults_table_columns() {
        assert!(CREATE_DEFAULTS_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_DEFAULTS_TABLE.contains("value TEXT NOT NULL"));
        assert!(CREATE_DEFAULTS_TABLE.contains("updated_at"));
    }
}
