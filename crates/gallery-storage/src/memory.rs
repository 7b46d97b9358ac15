//! In-process blob backend.
//!
//! Blobs live in a shared map and vanish with the process. Unlike the filesystem and S3
//! backends, deleting a key that is not present reports `NotFound`.

use crate::keys::generate_storage_key;
use crate::traits::{admit, ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use gallery_core::{UploadPolicy, UploadedFile};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, Bytes>>>,
    policy: UploadPolicy,
}

impl MemoryStorage {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    /// Number of blobs currently held.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn store(&self, owner_id: Uuid, upload: &UploadedFile) -> StorageResult<String> {
        admit(&self.policy, upload)?;

        let key = generate_storage_key(owner_id, upload.declared_name());
        self.blobs
            .write()
            .await
            .insert(key.clone(), upload.data.clone());

        tracing::debug!(key = %key, size_bytes = upload.size(), "Memory storage write");
        Ok(key)
    }

    async fn retrieve(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let data = self
            .blobs
            .read()
            .await
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))?;

        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.blobs
            .write()
            .await
            .remove(storage_key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.blobs.read().await.contains_key(storage_key))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.blobs
            .read()
            .await
            .get(storage_key)
            .map(|data| data.len() as u64)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    fn policy(&self) -> &UploadPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn store_retrieve_delete() {
        let storage = MemoryStorage::default();
        let upload = UploadedFile::new(Bytes::from_static(b"pixels")).with_content_type("image/png");

        let key = storage.store(Uuid::new_v4(), &upload).await.unwrap();
        assert_eq!(storage.content_length(&key).await.unwrap(), 6);

        let mut stream = storage.retrieve(&key).await.unwrap();
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk, Bytes::from_static(b"pixels"));
        assert!(stream.next().await.is_none());

        storage.delete(&key).await.unwrap();
        assert!(!storage.exists(&key).await.unwrap());
        assert!(matches!(
            storage.delete(&key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn clones_share_blobs() {
        let storage = MemoryStorage::default();
        let clone = storage.clone();
        let key = storage
            .store(Uuid::new_v4(), &UploadedFile::new(vec![1u8]))
            .await
            .unwrap();
        assert!(clone.exists(&key).await.unwrap());
        assert_eq!(clone.len().await, 1);
    }

    #[tokio::test]
    async fn rejected_upload_is_not_kept() {
        let storage = MemoryStorage::new(UploadPolicy::new(["image/png"], 16, true));
        let upload = UploadedFile::new(vec![0u8]).with_content_type("application/zip");
        let result = storage.store(Uuid::new_v4(), &upload).await;
        assert!(matches!(result, Err(StorageError::RejectedContentType(_))));
        assert!(storage.is_empty().await);
    }
}
