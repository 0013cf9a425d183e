//! Store abstraction for cached documents
//!
//! The refresh pipeline and the HTTP layer only see the [`ScheduleStore`]
//! trait, so tests can swap the on-disk store for an in-memory one.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │      ScheduleService / DirectoryCrawler     │
//! └─────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │        ScheduleStore (read / write)         │
//! └─────────────────────────────────────────────┘
//!              │                     │
//!              ▼                     ▼
//!     ┌─────────────────┐   ┌─────────────────┐
//!     │    FileStore    │   │   MemoryStore   │
//!     │ <dir>/<key>.json│   │   (tests, dev)  │
//!     └─────────────────┘   └─────────────────┘
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::ScheduleKey;
use crate::utils::error::StorageError;

/// Key/value store of JSON documents
///
/// Writes overwrite unconditionally. Two writers on the same key race with
/// last-write-wins semantics.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Read the document stored under `key`, `None` when absent
    async fn read(&self, key: &ScheduleKey) -> Result<Option<String>, StorageError>;

    /// Replace the document stored under `key`
    async fn write(&self, key: &ScheduleKey, value: &str) -> Result<(), StorageError>;
}

// ============================================================================
// File Store
// ============================================================================

/// Store writing one `<key>.json` file per key into a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key
    pub fn path_for(&self, key: &ScheduleKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl ScheduleStore for FileStore {
    async fn read(&self, key: &ScheduleKey) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn write(&self, key: &ScheduleKey, value: &str) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            key: key.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(write_err)?;

        let path = self.path_for(key);
        tokio::fs::write(&path, value).await.map_err(write_err)?;

        debug!(path = %path.display(), bytes = value.len(), "Stored document");
        Ok(())
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<ScheduleKey, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn read(&self, key: &ScheduleKey) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &ScheduleKey, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.clone(), value.to_string());
        Ok(())
    }
}
