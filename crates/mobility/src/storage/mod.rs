//! Persistence adapter for mobility.
//!
//! Both stores persist through a [`KeyValueStore`]: a flat, string-keyed
//! namespace of typed [`Value`]s. Every call is synchronous and durable on
//! return, and there are no transactions spanning more than one key.

pub mod memory;
pub mod migrations;
pub mod schema;
pub mod sqlite;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A single persisted value.
///
/// Mirrors the value kinds a platform settings store accepts: booleans,
/// integers, string arrays and opaque data blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An ordered list of strings.
    Strings(Vec<String>),
    /// An opaque encoded blob.
    Data(Vec<u8>),
}

impl Value {
    /// The boolean payload, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The string list, if this is `Strings`.
    #[must_use]
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::Strings(s) => Some(s),
            _ => None,
        }
    }

    /// The raw bytes, if this is `Data`.
    #[must_use]
    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Self::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Short name of the value kind, for logs and diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Strings(_) => "strings",
            Self::Data(_) => "data",
        }
    }
}

/// Synchronous key-value persistence.
///
/// Implementations must survive process restart (except explicitly
/// ephemeral ones such as [`MemoryStore`]) and must treat removal of an
/// absent key as success.
pub trait KeyValueStore: std::fmt::Debug {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently stored, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn keys(&self) -> Result<Vec<String>>;

    /// Like [`get`](Self::get), but an entry that exists and does not decode
    /// reads as absent and is logged at `warn`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_or_discard(&self, key: &str) -> Result<Option<Value>> {
        match self.get(key) {
            Err(Error::CorruptEntry { key, message }) => {
                warn!("Discarding unreadable entry {}: {}", key, message);
                Ok(None)
            }
            other => other,
        }
    }

    /// Read a boolean, falling back to `default` when absent or mistyped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self
            .get_or_discard(key)?
            .and_then(|v| v.as_bool())
            .unwrap_or(default))
    }

    /// Read an integer, falling back to `default` when absent or mistyped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self
            .get_or_discard(key)?
            .and_then(|v| v.as_int())
            .unwrap_or(default))
    }

    /// Read a string list, falling back to `default` when absent or mistyped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn strings_or(&self, key: &str, default: Vec<String>) -> Result<Vec<String>> {
        Ok(match self.get_or_discard(key)? {
            Some(Value::Strings(s)) => s,
            _ => default,
        })
    }
}
