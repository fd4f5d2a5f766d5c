//! # poolside-storage
//!
//! Durable key-value stores shared between contexts, and
//! [`PersistentCell`]: one named value mirrored into the store and kept in
//! step with every other context that observes the same key. Last write
//! wins.
//!
//! ```
//! use poolside_storage::{MemoryStorage, PersistentCell, StorageHub};
//! use std::sync::Arc;
//!
//! let hub = StorageHub::new(Arc::new(MemoryStorage::new()));
//! let here = PersistentCell::new(hub.context(), "units", "meters".to_string());
//! let there = PersistentCell::new(hub.context(), "units", "meters".to_string());
//!
//! here.write("yards".to_string());
//! assert_eq!(here.read(), "yards");
//! assert_eq!(there.read(), "meters");
//!
//! there.sync_pending();
//! assert_eq!(there.read(), "yards");
//! ```

pub mod cell;
pub mod config;
pub mod error;
pub mod hub;
pub mod storage;

pub use cell::{Codec, PersistentCell};
pub use config::{FilesystemConfig, StorageBackend, StorageConfig};
pub use error::StorageError;
pub use hub::{StorageContext, StorageEvent, StorageEvents, StorageHub};
pub use storage::{FilesystemStorage, MemoryStorage, Storage};
