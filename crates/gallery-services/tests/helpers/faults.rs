use async_trait::async_trait;
use gallery_core::{AppError, Asset, UploadPolicy, UploadedFile};
use gallery_services::{AssetStore, ByteStream, Storage, StorageBackend, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Blob store wrapper whose writes and deletes can be made to fail.
#[derive(Clone)]
pub struct FlakyStorage {
    inner: Arc<dyn Storage>,
    fail_store: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
}

impl FlakyStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self {
            inner,
            fail_store: Arc::new(AtomicBool::new(false)),
            fail_delete: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_store(&self, fail: bool) {
        self.fail_store.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn store(&self, owner_id: Uuid, upload: &UploadedFile) -> StorageResult<String> {
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("No space left on device".into()));
        }
        self.inner.store(owner_id, upload).await
    }

    async fn retrieve(&self, storage_key: &str) -> StorageResult<ByteStream> {
        self.inner.retrieve(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("Permission denied".into()));
        }
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.inner.content_length(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }

    fn policy(&self) -> &UploadPolicy {
        self.inner.policy()
    }
}

/// Metadata store wrapper whose saves and deletes can be made to fail.
#[derive(Clone)]
pub struct FlakyAssetStore {
    inner: Arc<dyn AssetStore>,
    fail_save: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
}

impl FlakyAssetStore {
    pub fn new(inner: Arc<dyn AssetStore>) -> Self {
        Self {
            inner,
            fail_save: Arc::new(AtomicBool::new(false)),
            fail_delete: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    fn unavailable() -> AppError {
        AppError::Persistence("connection refused".into())
    }
}

#[async_trait]
impl AssetStore for FlakyAssetStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Asset>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Asset>, AppError> {
        self.inner.find_by_id_and_owner(id, owner_id).await
    }

    async fn find_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, AppError> {
        self.inner.find_all_by_owner(owner_id).await
    }

    async fn find_all_by_fragment(&self, fragment: &str) -> Result<Vec<Asset>, AppError> {
        self.inner.find_all_by_fragment(fragment).await
    }

    async fn find_all_by_owner_and_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> Result<Vec<Asset>, AppError> {
        self.inner
            .find_all_by_owner_and_fragment(owner_id, fragment)
            .await
    }

    async fn find_all_ordered(&self) -> Result<Vec<Asset>, AppError> {
        self.inner.find_all_ordered().await
    }

    async fn save(&self, asset: &Asset) -> Result<Asset, AppError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.save(asset).await
    }

    async fn update(&self, asset: &Asset) -> Result<Option<Asset>, AppError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.update(asset).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.delete(id).await
    }
}
