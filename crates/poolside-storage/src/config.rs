//! Storage configuration types

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::hub::StorageHub;
use crate::storage::{FilesystemStorage, MemoryStorage, Storage};

/// Storage backend selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory storage (fast, non-persistent)
    Memory,

    /// One file per key under a directory
    Filesystem(FilesystemConfig),
}

/// Filesystem storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesystemConfig {
    /// Storage directory path
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

/// `[storage]` section of poolside.toml
///
/// `type` is required whenever the section is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub backend: StorageBackend,

    /// Prefix applied to every key in the store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from(".poolside/storage")
}

fn default_key_prefix() -> String {
    "poolside:".to_string()
}

impl StorageConfig {
    /// Open the configured store behind a hub with the configured prefix
    pub fn open(&self) -> Result<StorageHub> {
        let store: Arc<dyn Storage> = match &self.backend {
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
            StorageBackend::Filesystem(config) => Arc::new(
                FilesystemStorage::new(&config.path).with_context(|| {
                    format!("Failed to open storage directory {}", config.path.display())
                })?,
            ),
        };

        tracing::debug!(backend = store.name(), prefix = %self.key_prefix, "storage opened");
        Ok(StorageHub::new(store).with_key_prefix(self.key_prefix.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.key_prefix, "poolside:");
    }

    #[test]
    fn test_parse_tagged_backends() {
        let memory: StorageConfig = toml::from_str(r#"type = "memory""#).unwrap();
        assert_eq!(memory, StorageConfig::default());

        let filesystem: StorageConfig = toml::from_str(
            r#"
            type = "filesystem"
            path = "/var/lib/poolside"
            key_prefix = "swim:"
            "#,
        )
        .unwrap();
        assert_eq!(
            filesystem.backend,
            StorageBackend::Filesystem(FilesystemConfig {
                path: PathBuf::from("/var/lib/poolside"),
            })
        );
        assert_eq!(filesystem.key_prefix, "swim:");

        let no_path: StorageConfig = toml::from_str(r#"type = "filesystem""#).unwrap();
        assert_eq!(
            no_path.backend,
            StorageBackend::Filesystem(FilesystemConfig::default())
        );
    }

    #[test]
    fn test_unknown_backend_rejected_when_parsing() {
        let result = toml::from_str::<StorageConfig>(r#"type = "dragonfly""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_filesystem_with_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Filesystem(FilesystemConfig {
                path: temp_dir.path().join("store"),
            }),
            key_prefix: "test:".to_string(),
        };

        let hub = config.open().unwrap();
        assert_eq!(hub.store().name(), "filesystem");

        hub.context().set_item("units", "\"yards\"").unwrap();
        assert_eq!(
            hub.store().get_item("test:units").unwrap().as_deref(),
            Some("\"yards\"")
        );
    }
}
