// File: poolside-storage/src/hub.rs
// Purpose: Share one durable store between contexts and broadcast their writes

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::error::Result;
use crate::storage::Storage;

const EVENT_CAPACITY: usize = 1000;

/// A write made through one context, as seen by the others
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key without the hub prefix
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the key was removed
    pub new_value: Option<String>,
    /// Id of the context that made the write
    pub origin: u64,
}

/// A durable store plus the change bus of everyone using it
#[derive(Clone)]
pub struct StorageHub {
    store: Arc<dyn Storage>,
    events: broadcast::Sender<StorageEvent>,
    next_context: Arc<AtomicU64>,
    key_prefix: String,
}

impl StorageHub {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self::with_capacity(store, EVENT_CAPACITY)
    }

    /// Create a hub whose receivers lag after `capacity` unread events
    pub fn with_capacity(store: Arc<dyn Storage>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            store,
            events,
            next_context: Arc::new(AtomicU64::new(1)),
            key_prefix: String::new(),
        }
    }

    /// Namespace every key under `prefix` in the underlying store
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Open a new context with its own origin id
    pub fn context(&self) -> StorageContext {
        let id = self.next_context.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(context = id, backend = self.store.name(), "storage context opened");
        StorageContext {
            id,
            hub: self.clone(),
        }
    }

    pub fn store(&self) -> &Arc<dyn Storage> {
        &self.store
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn store_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

impl fmt::Debug for StorageHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageHub")
            .field("backend", &self.store.name())
            .field("key_prefix", &self.key_prefix)
            .field("receivers", &self.events.receiver_count())
            .finish()
    }
}

/// One participant sharing the hub's store
///
/// Writes go straight to the store and are announced to every other
/// context. A context never hears about its own writes.
#[derive(Debug, Clone)]
pub struct StorageContext {
    id: u64,
    hub: StorageHub,
}

impl StorageContext {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn hub(&self) -> &StorageHub {
        &self.hub
    }

    /// Open a sibling context on the same hub with its own origin id
    ///
    /// Writes through the fork reach this context and the other way round.
    pub fn fork(&self) -> StorageContext {
        self.hub.context()
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.hub.store.get_item(&self.hub.store_key(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let store_key = self.hub.store_key(key);
        let old_value = self.hub.store.get_item(&store_key)?;
        self.hub.store.set_item(&store_key, value)?;
        self.publish(key, old_value, Some(value.to_string()));
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let store_key = self.hub.store_key(key);
        let old_value = self.hub.store.get_item(&store_key)?;
        self.hub.store.remove_item(&store_key)?;
        self.publish(key, old_value, None);
        Ok(())
    }

    /// Keys under the hub prefix, with the prefix stripped
    pub fn keys(&self) -> Result<Vec<String>> {
        let prefix = self.hub.key_prefix();
        Ok(self
            .hub
            .store
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(prefix).map(str::to_string))
            .collect())
    }

    /// Receive writes made by other contexts from now on
    pub fn subscribe(&self) -> StorageEvents {
        StorageEvents {
            origin: self.id,
            receiver: self.hub.events.subscribe(),
        }
    }

    fn publish(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        let event = StorageEvent {
            key: key.to_string(),
            old_value,
            new_value,
            origin: self.id,
        };
        // No receivers is fine
        let delivered = self.hub.events.send(event).unwrap_or(0);
        tracing::trace!(key, origin = self.id, delivered, "storage change published");
    }
}

/// Stream of writes from other contexts
#[derive(Debug)]
pub struct StorageEvents {
    origin: u64,
    receiver: broadcast::Receiver<StorageEvent>,
}

impl StorageEvents {
    pub async fn recv(&mut self) -> std::result::Result<StorageEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if event.origin != self.origin {
                return Ok(event);
            }
        }
    }

    pub fn try_recv(&mut self) -> std::result::Result<StorageEvent, TryRecvError> {
        loop {
            let event = self.receiver.try_recv()?;
            if event.origin != self.origin {
                return Ok(event);
            }
        }
    }
}
