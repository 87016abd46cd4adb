use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::RepositoryError;

/// Named blobs, read and written whole.
#[async_trait]
pub trait SlotStore: Send + Sync + 'static {
    async fn read(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
    async fn remove(&self, key: &str) -> Result<(), RepositoryError>;
}

/// Reads a JSON slot. Absent or malformed content yields the default value.
pub async fn read_json<T>(store: &dyn SlotStore, key: &str) -> Result<T, RepositoryError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.read(key).await? else {
        debug!(key, "Slot empty");
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key, error = %e, "Slot content malformed, starting empty");
            Ok(T::default())
        }
    }
}

pub async fn write_json<T>(store: &dyn SlotStore, key: &str, value: &T) -> Result<(), RepositoryError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.write(key, &raw).await
}

/// One `<key>.json` file per slot under a data directory.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl SlotStore for FileSlotStore {
    async fn read(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file and renames it over the slot, so a
    /// crash never leaves a half-written slot behind.
    async fn write(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(key, bytes = value.len(), "Slot written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), RepositoryError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process slots, used by tests and the demo.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn read(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.slots.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.slots.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), RepositoryError> {
        self.slots.lock().await.remove(key);
        Ok(())
    }
}
