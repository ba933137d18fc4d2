use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        let raw = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "file".to_string());
        let backend = match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => StorageBackend::Memory,
            "file" | "fs" => {
                let dir = env::var("STORAGE_DIR").unwrap_or_else(|_| "./data".to_string());
                StorageBackend::File(PathBuf::from(dir))
            }
            other => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 'memory' or 'file', got '{}'",
                    other
                ))
            }
        };
        Ok(Self { backend })
    }

    /// Open the configured backend.
    pub fn open(&self) -> Result<Arc<dyn KeyValueStore>> {
        Ok(match &self.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File(dir) => Arc::new(FileStore::open(dir).map_err(|e| {
                anyhow::anyhow!("Failed to open storage directory '{}': {}", dir.display(), e)
            })?),
        })
    }
}
