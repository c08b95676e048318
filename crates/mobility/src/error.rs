//! Error type shared by the stores, the storage backends and the binary.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong in this crate.
#[derive(Error, Debug)]
pub enum Error {
    // Storage
    /// The defaults database could not be opened or created.
    #[error("cannot open defaults database {path}: {source}")]
    OpenDatabase {
        /// Database file.
        path: PathBuf,
        /// What `SQLite` reported.
        #[source]
        source: rusqlite::Error,
    },

    /// A statement against the defaults database failed.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database schema is missing, unreadable, or too new.
    #[error("schema: {0}")]
    Schema(String),

    /// A persisted entry exists but does not decode.
    #[error("corrupt entry for key '{key}': {message}")]
    CorruptEntry {
        /// Key of the unreadable entry.
        key: String,
        /// Decoder message.
        message: String,
    },

    // Configuration
    /// Config sources could not be merged or extracted.
    #[error("config: {0}")]
    Config(Box<figment::Error>),

    /// Config was parsed but holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Caller input
    /// A value supplied by the caller could not be interpreted.
    #[error("invalid value for {field}: {message}")]
    InvalidInput {
        /// Field or argument the value was meant for.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    // Filesystem and encoding
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A parent directory for the database could not be created.
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Broken internal state, such as a poisoned lock.
    #[error("internal error: {0}")]
    Internal(String),
}

/// `Result` with this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl Error {
    /// An [`Error::InvalidInput`] for `field`.
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// An [`Error::CorruptEntry`] for `key`.
    #[must_use]
    pub fn corrupt_entry(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptEntry {
            key: key.into(),
            message: message.into(),
        }
    }

    /// An [`Error::Internal`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the caller supplied something unusable.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Whether the failure came from the persistence layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::OpenDatabase { .. }
                | Self::Sqlite(_)
                | Self::Schema(_)
                | Self::CorruptEntry { .. }
                | Self::CreateDir { .. }
        )
    }
}
