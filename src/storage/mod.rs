//! Key-value persistence for reports and the admin session.
//!
//! Everything the app persists goes through [`KeyValueStore`], so the
//! report store can run against memory in tests and against files on disk
//! in a deployment.

pub mod file;
pub mod memory;
pub mod notify;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use notify::{ChangeFeed, NotifyingStore, StorageEvent, StorageEventKind};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Byte-valued key-value store with string keys.
///
/// Implementations only need single-key atomicity. Callers that
/// read, modify and write a value get no isolation from each other.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

/// Keys double as file names in [`FileStore`], so only a conservative
/// character set is accepted.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
