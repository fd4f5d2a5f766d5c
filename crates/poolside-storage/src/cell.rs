// File: poolside-storage/src/cell.rs
// Purpose: A single named value mirrored into the shared store

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use crate::hub::{StorageContext, StorageEvent, StorageEvents};

type SerializeFn<T> = dyn Fn(&T) -> anyhow::Result<String> + Send + Sync;
type DeserializeFn<T> = dyn Fn(&str) -> anyhow::Result<T> + Send + Sync;

/// How a cell turns its value into the stored string and back
pub struct Codec<T> {
    serialize: Arc<SerializeFn<T>>,
    deserialize: Arc<DeserializeFn<T>>,
}

impl<T> Codec<T> {
    pub fn new<S, D>(serialize: S, deserialize: D) -> Self
    where
        S: Fn(&T) -> anyhow::Result<String> + Send + Sync + 'static,
        D: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }

    pub fn serialize(&self, value: &T) -> anyhow::Result<String> {
        (self.serialize)(value)
    }

    pub fn deserialize(&self, raw: &str) -> anyhow::Result<T> {
        (self.deserialize)(raw)
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> {
    pub fn json() -> Self {
        Self::new(
            |value| Ok(serde_json::to_string(value)?),
            |raw| Ok(serde_json::from_str(raw)?),
        )
    }
}

impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        Self {
            serialize: Arc::clone(&self.serialize),
            deserialize: Arc::clone(&self.deserialize),
        }
    }
}

struct CellInner<T> {
    context: StorageContext,
    key: String,
    initial: T,
    codec: Codec<T>,
    state: watch::Sender<T>,
    /// Taken by the background listener once `listen` is called
    events: Mutex<Option<StorageEvents>>,
    listener: Mutex<Option<AbortHandle>>,
}

impl<T> CellInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn events(&self) -> MutexGuard<'_, Option<StorageEvents>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stored value, or the initial value when missing or unreadable
    fn load(&self) -> T {
        match self.context.get_item(&self.key) {
            Ok(Some(raw)) => self.decode_or_initial(&raw),
            Ok(None) => self.initial.clone(),
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "storage unavailable, using initial value");
                self.initial.clone()
            }
        }
    }

    fn decode_or_initial(&self, raw: &str) -> T {
        self.codec.deserialize(raw).unwrap_or_else(|error| {
            tracing::warn!(key = %self.key, %error, "stored value unreadable, using initial value");
            self.initial.clone()
        })
    }

    /// Returns whether the event concerned this cell
    ///
    /// The store is re-read rather than trusting `new_value`: a later write
    /// may already have replaced it, and the store holds the last one.
    fn apply(&self, event: &StorageEvent) -> bool {
        if event.key != self.key {
            return false;
        }
        tracing::trace!(key = %self.key, origin = event.origin, "applying storage change");
        self.state.send_replace(self.load());
        true
    }

    fn resync(&self, skipped: u64) {
        tracing::warn!(key = %self.key, skipped, "storage notifications lagged, re-reading store");
        self.state.send_replace(self.load());
    }
}

impl<T> Drop for CellInner<T> {
    fn drop(&mut self) {
        let listener = self.listener.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }
}

/// A value persisted under one key and kept in step with other contexts
///
/// Writes are visible to the writing cell immediately. Other cells on the
/// same key pick them up when they process notifications, either on demand
/// with [`sync_pending`](Self::sync_pending) or continuously after
/// [`listen`](Self::listen). Storage and decoding failures never reach the
/// caller: they are logged and the cell falls back to its in-memory value.
pub struct PersistentCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for PersistentCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PersistentCell<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a JSON-encoded cell
    pub fn new(context: StorageContext, key: impl Into<String>, initial: T) -> Self {
        Self::with_codec(context, key, initial, Codec::json())
    }
}

impl<T> PersistentCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn with_codec(
        context: StorageContext,
        key: impl Into<String>,
        initial: T,
        codec: Codec<T>,
    ) -> Self {
        // Each cell is its own origin so cells sharing a context still hear each other
        let context = context.fork();
        // Subscribe before the first read so no write falls in between
        let events = context.subscribe();
        let (state, _) = watch::channel(initial.clone());

        let inner = Arc::new(CellInner {
            context,
            key: key.into(),
            initial,
            codec,
            state,
            events: Mutex::new(Some(events)),
            listener: Mutex::new(None),
        });
        inner.state.send_replace(inner.load());

        Self { inner }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn read(&self) -> T {
        self.inner.state.borrow().clone()
    }

    /// Persist and publish a new value
    pub fn write(&self, value: T) {
        let inner = &self.inner;
        match inner.codec.serialize(&value) {
            Ok(raw) => {
                if let Err(error) = inner.context.set_item(&inner.key, &raw) {
                    tracing::warn!(key = %inner.key, %error, "storage write failed, keeping value in memory");
                }
            }
            Err(error) => {
                tracing::warn!(key = %inner.key, %error, "value not serializable, keeping it in memory");
            }
        }
        inner.state.send_replace(value);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = {
            let current = self.inner.state.borrow();
            f(&*current)
        };
        self.write(next);
    }

    /// Delete the stored value and return to the initial value
    pub fn remove(&self) {
        let inner = &self.inner;
        if let Err(error) = inner.context.remove_item(&inner.key) {
            tracing::warn!(key = %inner.key, %error, "storage remove failed");
        }
        inner.state.send_replace(inner.initial.clone());
    }

    /// Apply every notification received so far; returns how many concerned this cell
    ///
    /// Does nothing once [`listen`](Self::listen) has taken over.
    pub fn sync_pending(&self) -> usize {
        let mut guard = self.inner.events();
        let Some(events) = guard.as_mut() else {
            return 0;
        };

        let mut applied = 0;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    if self.inner.apply(&event) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    self.inner.resync(skipped);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        applied
    }

    /// Apply notifications in a background task as they arrive
    ///
    /// Returns `None` if the cell is already listening. The task ends when
    /// the last clone of the cell is dropped.
    pub fn listen(&self) -> Option<JoinHandle<()>> {
        let mut events = self.inner.events().take()?;
        let weak: Weak<CellInner<T>> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            loop {
                let received = events.recv().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                match received {
                    Ok(event) => {
                        inner.apply(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => inner.resync(skipped),
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let mut listener = self.inner.listener.lock().unwrap_or_else(|e| e.into_inner());
        *listener = Some(handle.abort_handle());
        Some(handle)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.state.subscribe()
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentCell")
            .field("key", &self.inner.key)
            .field("value", &*self.inner.state.borrow())
            .field("context", &self.inner.context.id())
            .finish()
    }
}
