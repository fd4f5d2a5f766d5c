//! Durable key-value backends

use crate::error::Result;

pub mod filesystem;
pub mod memory;

pub use filesystem::FilesystemStorage;
pub use memory::MemoryStorage;

/// Trait for string key-value stores
///
/// Operations are synchronous and expected to be fast; callers on an async
/// runtime use them directly.
pub trait Storage: Send + Sync {
    /// Get the stored string for a key
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store a string under a key, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;

    /// All stored keys, in no particular order
    fn keys(&self) -> Result<Vec<String>>;

    /// Backend name, for logs
    fn name(&self) -> &'static str;
}
