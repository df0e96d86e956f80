//! In-memory storage location.
//!
//! Used by tests and by embedders that keep the session for the lifetime
//! of the process only.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{StorageError, StorageLocation};

/// In-memory key/value location. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    name: Arc<str>,
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty location with the given name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            values: Arc::default(),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl StorageLocation for MemoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_values() {
        let storage = MemoryStorage::new("local");
        let view = storage.clone();

        storage.set("token", "T1").unwrap();
        assert_eq!(view.get("token").unwrap().as_deref(), Some("T1"));

        view.remove("token").unwrap();
        assert!(storage.is_empty());
        assert_eq!(storage.name(), "local");
    }
}
