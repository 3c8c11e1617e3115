//! FileStore — durable JSON collections on local disk
//!
//! Each collection is one document, read whole and replaced whole.
//! All operations return `Result<T, RegistryError>` (railway programming).
//!
//! # Example
//!
//! ```rust,no_run
//! use polarway_registry::{FileStore, RegistryConfig};
//! use polarway_registry::users::UserRecord;
//!
//! #[tokio::main]
//! async fn main() -> polarway_registry::Result<()> {
//!     let store = FileStore::new(&RegistryConfig::new("/data/registry")).await?;
//!
//!     // Never-saved collections fall back to the supplied default
//!     let users: Vec<UserRecord> = store.load("users", Vec::new).await?;
//!
//!     // Replace-all save, durable before returning
//!     store.save("users", &users).await?;
//!
//!     Ok(())
//! }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};

/// Durable collection store rooted at a data directory
///
/// Thread-safe: can be shared across tokio tasks via `Arc<FileStore>`.
/// At most one `save` per collection is in flight at any time. The store
/// never merges concurrent writes; read-modify-write cycles must be
/// serialized by the collection's owner.
#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileStore {
    /// Create a new FileStore, creating the data directory if needed
    pub async fn new(config: &RegistryConfig) -> Result<Self> {
        Self::open(&config.data_dir).await
    }

    /// Open a store at an explicit directory
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| RegistryError::StoreFailure {
                collection: "*".into(),
                reason: format!("cannot create {}: {e}", data_dir.display()),
            })?;

        info!(path = %data_dir.display(), "Registry store initialized");
        Ok(Self {
            data_dir,
            write_locks: DashMap::new(),
        })
    }

    /// Path of the document backing a collection
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }

    /// Whether a collection has ever been saved
    pub async fn exists(&self, collection: &str) -> bool {
        tokio::fs::try_exists(self.collection_path(collection))
            .await
            .unwrap_or(false)
    }

    // ─── Read ───

    /// Load a whole collection
    ///
    /// A collection that has never been saved yields `default()`. Any other
    /// read or decode failure is a `StoreFailure`, never an empty collection.
    pub async fn load<T, F>(&self, collection: &str, default: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.collection_path(collection);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let doc = serde_json::from_slice(&bytes)
                    .map_err(|e| failure(collection, format!("decode: {e}")))?;
                debug!(collection, bytes = bytes.len(), "Loaded collection");
                Ok(doc)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(collection, "Collection not yet saved, using default");
                Ok(default())
            }
            Err(e) => Err(failure(collection, format!("read: {e}"))),
        }
    }

    // ─── Write ───

    /// Replace a whole collection
    ///
    /// Writes a sibling temp file, fsyncs it, renames it over the document
    /// and fsyncs the directory. Returns only once the write is durable.
    pub async fn save<T>(&self, collection: &str, contents: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec_pretty(contents)
            .map_err(|e| failure(collection, format!("encode: {e}")))?;

        let lock = self.write_lock(collection);
        let _guard = lock.lock().await;

        let path = self.collection_path(collection);
        let tmp = self.data_dir.join(format!("{collection}.json.tmp"));

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| failure(collection, format!("create temp: {e}")))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| failure(collection, format!("write: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| failure(collection, format!("fsync: {e}")))?;
        drop(file);

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| failure(collection, format!("rename: {e}")))?;
        sync_dir(&self.data_dir)
            .await
            .map_err(|e| failure(collection, format!("fsync dir: {e}")))?;

        debug!(collection, bytes = bytes.len(), "Saved collection");
        Ok(())
    }

    fn write_lock(&self, collection: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(collection.to_string())
            .or_default()
            .clone()
    }
}

fn failure(collection: &str, reason: String) -> RegistryError {
    RegistryError::StoreFailure {
        collection: collection.to_string(),
        reason,
    }
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
