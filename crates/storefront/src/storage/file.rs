//! File-backed storage: one JSON document per key.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Storage, StorageError, validate_key};

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a uniquely named sibling temporary file first and are then
/// renamed into place, so a crash mid-write never leaves a truncated entry
/// behind and concurrent writers never share a temporary file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".json.tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(key, path = %path.display(), "Persisted storage entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "Removed storage entry");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.get("cart-storage").unwrap().is_none());
    }

    #[test]
    fn test_set_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested/state"));

        storage.set("auth-storage", "{\"a\":1}").unwrap();
        storage.set("auth-storage", "{\"a\":2}").unwrap();

        assert_eq!(
            storage.get("auth-storage").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        let entries: Vec<_> = fs::read_dir(storage.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["auth-storage.json"]);
    }

    #[test]
    fn test_concurrent_writers_to_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|n| {
                    let storage = storage.clone();
                    scope.spawn(move || {
                        for round in 0..20 {
                            storage
                                .set("cart-storage", &format!("{{\"writer\":{n},\"round\":{round}}}"))
                                .unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });

        let raw = storage.get("cart-storage").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["round"], 19);
        let entries: Vec<_> = fs::read_dir(storage.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["cart-storage.json"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("cart-storage", "{}").unwrap();
        storage.remove("cart-storage").unwrap();
        storage.remove("cart-storage").unwrap();
        assert!(storage.get("cart-storage").unwrap().is_none());
    }

    #[test]
    fn test_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::new(dir.path()).set("cart-storage", "kept").unwrap();
        assert_eq!(
            FileStorage::new(dir.path()).get("cart-storage").unwrap().as_deref(),
            Some("kept")
        );
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
