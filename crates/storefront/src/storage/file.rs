//! JSON file storage location.
//!
//! Holds the whole map in memory and writes the file through on every
//! change, so a CLI invocation sees what the previous one left behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{StorageError, StorageLocation};

/// Key/value location persisted as a JSON object in one file.
pub struct FileStorage {
    name: String,
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the file at `path`.
    ///
    /// A missing file is treated as empty; it is created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            name: name.into(),
            path,
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl StorageLocation for FileStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("local.json");

        let storage = FileStorage::open("local", &path).unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
        storage.set("token", "T1").unwrap();

        let reopened = FileStorage::open("local", &path).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("T1"));

        reopened.remove("token").unwrap();
        let again = FileStorage::open("local", &path).unwrap();
        assert_eq!(again.get("token").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStorage::open("cookies", &path),
            Err(StorageError::Serialization(_))
        ));
    }
}
