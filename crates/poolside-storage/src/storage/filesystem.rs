//! Filesystem storage backend

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};
use crate::storage::Storage;

const EXTENSION: &str = "value";

/// Filesystem storage backend
///
/// One file per key under a directory, holding the raw stored string.
/// Keys are percent-encoded into file names so any key round-trips.
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", urlencoding::encode(key), EXTENSION))
    }

    fn path_to_key(path: &Path) -> Option<String> {
        if path.extension()? != EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        urlencoding::decode(stem).ok().map(|key| key.into_owned())
    }
}

impl Storage for FilesystemStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_to_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_to_path(key);
        let staging = path.with_extension("tmp");

        // Replace atomically so readers never see a half-written value
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_to_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file() {
                if let Some(key) = Self::path_to_key(&path) {
                    keys.push(key);
                }
            }
        }

        Ok(keys)
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_filesystem_storage_basic() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp_dir.path()).unwrap();

        assert_eq!(storage.get_item("poolside:units").unwrap(), None);

        storage.set_item("poolside:units", "\"yards\"").unwrap();
        assert_eq!(
            storage.get_item("poolside:units").unwrap().as_deref(),
            Some("\"yards\"")
        );

        storage.remove_item("poolside:units").unwrap();
        assert_eq!(storage.get_item("poolside:units").unwrap(), None);
        assert!(storage.remove_item("poolside:units").is_ok());
    }

    #[rstest]
    #[case("units")]
    #[case("poolside:units")]
    #[case("lists/favourites")]
    #[case("a:b\\c d")]
    #[case("plan.v2")]
    #[case("../escape")]
    #[case("100% effort")]
    fn test_key_round_trip(#[case] key: &str) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp_dir.path()).unwrap();

        storage.set_item(key, "[]").unwrap();
        assert_eq!(storage.get_item(key).unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.keys().unwrap(), vec![key.to_string()]);
        assert!(storage.key_to_path(key).starts_with(temp_dir.path()));
    }

    #[test]
    fn test_keys_round_trip_unsafe_characters() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp_dir.path()).unwrap();

        storage.set_item("lists/favourites", "[]").unwrap();
        storage.set_item("a:b\\c d", "1").unwrap();
        fs::write(temp_dir.path().join("stray.txt"), "ignored").unwrap();

        let mut keys = storage.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a:b\\c d".to_string(), "lists/favourites".to_string()]);
    }

    #[test]
    fn test_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        FilesystemStorage::new(temp_dir.path())
            .unwrap()
            .set_item("pool_length", "25")
            .unwrap();

        let reopened = FilesystemStorage::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.get_item("pool_length").unwrap().as_deref(), Some("25"));
    }

    #[test]
    fn test_creates_nested_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("store");
        let storage = FilesystemStorage::new(&root).unwrap();
        assert!(storage.root().is_dir());
    }
}
