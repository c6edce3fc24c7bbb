use super::BlobStore;
use crate::common::error::{Result, TrafficError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// In-memory blob store for development/testing
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.blobs.lock().map_err(|_| TrafficError::Store {
            message: "in-memory store lock poisoned".to_string(),
        })
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn save(&self, key: &str, blob: &[u8]) -> Result<()> {
        self.lock()?.insert(key.to_string(), blob.to_vec());
        debug!("Saved blob {} ({} bytes)", key, blob.len());
        Ok(())
    }

    async fn save_many(&self, entries: &[(&str, &[u8])]) -> Result<()> {
        let mut blobs = self.lock()?;
        for &(key, blob) in entries {
            blobs.insert(key.to_string(), blob.to_vec());
        }
        debug!("Saved {} blobs", entries.len());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        debug!("Cleared in-memory blob store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = InMemoryBlobStore::new();
        assert!(store.load("k").await.unwrap().is_none());

        store.save("k", b"one").await.unwrap();
        store.save("k", b"two").await.unwrap();
        assert_eq!(store.load("k").await.unwrap().as_deref(), Some(&b"two"[..]));

        store.clear().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_save_many_writes_every_entry() {
        let store = InMemoryBlobStore::new();
        store.save_many(&[("a", &b"1"[..]), ("b", &b"2"[..])]).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.load("b").await.unwrap().as_deref(), Some(&b"2"[..]));
    }

    #[tokio::test]
    async fn test_clones_share_contents() {
        let store = InMemoryBlobStore::new();
        let other = store.clone();
        store.save("k", b"v").await.unwrap();
        assert!(other.load("k").await.unwrap().is_some());
    }
}
