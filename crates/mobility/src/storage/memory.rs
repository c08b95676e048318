//! In-process key-value store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

use super::{KeyValueStore, Value};

/// A [`KeyValueStore`] that keeps everything in memory.
///
/// Nothing survives the process; used for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> Error {
    Error::internal("memory store lock poisoned")
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("TextSize", &Value::Int(2)).unwrap();

        assert_eq!(store.get("TextSize").unwrap(), Some(Value::Int(2)));
        assert_eq!(store.get("Missing").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let store = MemoryStore::new();
        store.set("HapticFeedback", &Value::Bool(true)).unwrap();
        store.set("HapticFeedback", &Value::Bool(false)).unwrap();

        assert_eq!(
            store.get("HapticFeedback").unwrap(),
            Some(Value::Bool(false))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        store.set("AutoSaveRoutes", &Value::Bool(true)).unwrap();
        store.remove("AutoSaveRoutes").unwrap();

        assert!(store.get("AutoSaveRoutes").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_absent_key() {
        let store = MemoryStore::new();
        assert!(store.remove("Nothing").is_ok());
    }

    #[test]
    fn test_keys_sorted() {
        let store = MemoryStore::new();
        store.set("b", &Value::Int(1)).unwrap();
        store.set("a", &Value::Int(2)).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
