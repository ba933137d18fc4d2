use super::{KeyValueStore, StorageResult};
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEventKind {
    Set,
    Removed,
}

/// Published after a successful write through a [`NotifyingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub kind: StorageEventKind,
}

/// Subscription handle for the events of one [`NotifyingStore`].
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    events: broadcast::Sender<StorageEvent>,
}

impl ChangeFeed {
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

/// Wraps a store and broadcasts a [`StorageEvent`] for every write.
///
/// Writes made to the inner store directly are not observed.
pub struct NotifyingStore<S> {
    inner: S,
    events: broadcast::Sender<StorageEvent>,
}

impl<S: KeyValueStore> NotifyingStore<S> {
    pub fn new(inner: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { inner, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    pub fn feed(&self) -> ChangeFeed {
        ChangeFeed {
            events: self.events.clone(),
        }
    }

    fn publish(&self, key: &str, kind: StorageEventKind) {
        // Err only means nobody is listening.
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            kind,
        });
    }
}

impl<S: KeyValueStore> KeyValueStore for NotifyingStore<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.inner.set(key, value)?;
        tracing::trace!("storage key '{}' set", key);
        self.publish(key, StorageEventKind::Set);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)?;
        tracing::trace!("storage key '{}' removed", key);
        self.publish(key, StorageEventKind::Removed);
        Ok(())
    }
}
