//! In-memory blob store for tests and ephemeral deployments

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{validate_key, BlobStore, StorageError};

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        validate_key(key)?;
        self.blobs.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.blobs.write().await.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), StorageError> {
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        self.blobs.write().await.retain(|key, _| !key.starts_with(&dir));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip_and_purge() {
        let store = MemoryBlobStore::new();
        assert!(store.is_empty().await);

        store.put("projects/a/1", Bytes::from_static(b"one")).await.unwrap();
        store.put("projects/ab/1", Bytes::from_static(b"two")).await.unwrap();
        assert_eq!(store.get("projects/a/1").await.unwrap(), "one");

        // Prefix match is on whole path segments
        store.delete_prefix("projects/a").await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(matches!(
            store.get("projects/a/1").await,
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(store.get("projects/ab/1").await.unwrap(), "two");
    }
}
