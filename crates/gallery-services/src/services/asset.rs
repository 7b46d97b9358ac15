//! Asset coordination across the blob store and the metadata store.
//!
//! The two stores are not jointly transactional. Operations are ordered so that a partial
//! failure can only leave an orphaned blob (a blob no record points at), never a record whose
//! blob was deleted by this service:
//!
//! - create writes the blob first and inserts the record only after the write succeeded;
//! - delete removes the blob first and removes the record only after that succeeded.
//!
//! A failure of the second step is returned as-is. Nothing is retried or rolled back; the
//! affected storage key is logged so an operator can reconcile it.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use gallery_core::{AppError, Asset, AssetPatch, AssetQuery, UploadedFile};
use gallery_db::AssetStore;
use gallery_storage::{ByteStream, Storage, StorageError};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Asset coordinator.
///
/// Holds no state besides its two collaborators and takes no locks; clones share them.
#[derive(Clone)]
pub struct AssetService {
    storage: Arc<dyn Storage>,
    store: Arc<dyn AssetStore>,
}

impl AssetService {
    pub fn new(storage: Arc<dyn Storage>, store: Arc<dyn AssetStore>) -> Self {
        Self { storage, store }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    /// Store an uploaded payload and record it for `owner_id`.
    ///
    /// The blob store enforces its content-type whitelist and size cap; a refused payload
    /// surfaces as `AppError::RejectedContent` or `AppError::PayloadTooLarge` and nothing is
    /// written anywhere. If the record cannot be persisted after the blob was written, the
    /// persistence error is returned and the blob stays behind as an orphan.
    #[tracing::instrument(skip(self, upload, title, description), fields(owner_id = %owner_id, size_bytes = upload.size()))]
    pub async fn create(
        &self,
        upload: &UploadedFile,
        title: Option<String>,
        description: Option<String>,
        owner_id: Uuid,
    ) -> Result<Asset, AppError> {
        let storage_key = self.storage.store(owner_id, upload).await.map_err(|e| {
            if e.is_rejection() {
                tracing::info!(error = %e, "Upload refused by blob store");
            } else {
                tracing::error!(error = %e, "Blob write failed; no record created");
            }
            AppError::from(e)
        })?;

        let asset = Asset::from_upload(owner_id, storage_key, upload, title, description);

        match self.store.save(&asset).await {
            Ok(saved) => {
                tracing::info!(
                    asset_id = %saved.id(),
                    storage_key = %saved.storage_key(),
                    content_type = %saved.content_type(),
                    "Asset created"
                );
                Ok(saved)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    asset_id = %asset.id(),
                    storage_key = %asset.storage_key(),
                    "Metadata insert failed after blob write; blob is orphaned"
                );
                Err(e)
            }
        }
    }

    /// Persist a record through the metadata store (insert or update).
    pub async fn save(&self, asset: &Asset) -> Result<Asset, AppError> {
        self.store.save(asset).await
    }

    /// Validate and apply a title/description edit to an existing record.
    ///
    /// Only an existing record is changed. If it was deleted in the meantime the result is
    /// `AppError::NotFound` and nothing is written.
    #[tracing::instrument(skip(self, asset, patch), fields(asset_id = %asset.id()))]
    pub async fn update(&self, mut asset: Asset, patch: AssetPatch) -> Result<Asset, AppError> {
        patch.validate()?;
        asset.apply(patch);
        match self.store.update(&asset).await? {
            Some(updated) => Ok(updated),
            None => {
                tracing::warn!("Update of a record that no longer exists");
                Err(AppError::NotFound(format!("Asset {} not found", asset.id())))
            }
        }
    }

    /// Remove an asset's blob and then its record.
    ///
    /// The caller is responsible for having authorized the deletion (typically by obtaining
    /// `asset` through [`AssetService::get_owned`]); no ownership or existence check is
    /// repeated here. If the blob cannot be removed the record is left untouched and the
    /// call may be retried. A blob that is already gone counts as removed.
    #[tracing::instrument(skip(self, asset), fields(asset_id = %asset.id(), storage_key = %asset.storage_key()))]
    pub async fn delete(&self, asset: &Asset) -> Result<(), AppError> {
        match self.storage.delete(asset.storage_key()).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                tracing::warn!("Blob already absent; removing record");
            }
            Err(e) => {
                tracing::error!(error = %e, "Blob delete failed; record kept");
                return Err(e.into());
            }
        }

        match self.store.delete(asset.id()).await {
            Ok(true) => {
                tracing::info!("Asset deleted");
                Ok(())
            }
            Ok(false) => {
                tracing::debug!("Record was already absent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Metadata delete failed after blob removal; record now dangles"
                );
                Err(e)
            }
        }
    }

    /// Look up a record by id, regardless of owner.
    pub async fn get(&self, id: Uuid) -> Result<Option<Asset>, AppError> {
        self.store.find_by_id(id).await
    }

    /// Look up a record by id on behalf of `owner_id`.
    ///
    /// A record owned by someone else is reported exactly like a missing one.
    pub async fn get_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Asset>, AppError> {
        self.store.find_by_id_and_owner(id, owner_id).await
    }

    /// All assets of one owner, newest first.
    pub async fn search_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, AppError> {
        self.store.find_all_by_owner(owner_id).await
    }

    /// Assets whose title or description contains `fragment`, ignoring case.
    pub async fn search_by_fragment(&self, fragment: &str) -> Result<Vec<Asset>, AppError> {
        self.store.find_all_by_fragment(fragment).await
    }

    pub async fn search_by_owner_and_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> Result<Vec<Asset>, AppError> {
        self.store
            .find_all_by_owner_and_fragment(owner_id, fragment)
            .await
    }

    /// Dispatch a query to the matching listing.
    pub async fn search(&self, query: &AssetQuery) -> Result<Vec<Asset>, AppError> {
        match (query.owner_id, query.fragment.as_deref()) {
            (Some(owner_id), Some(fragment)) => {
                self.search_by_owner_and_fragment(owner_id, fragment).await
            }
            (Some(owner_id), None) => self.search_by_owner(owner_id).await,
            (None, Some(fragment)) => self.search_by_fragment(fragment).await,
            (None, None) => self.list().await,
        }
    }

    /// Every asset, newest first.
    pub async fn list(&self) -> Result<Vec<Asset>, AppError> {
        self.store.find_all_ordered().await
    }

    /// Open the asset's content.
    ///
    /// A reference that no longer resolves is `AppError::BlobNotFound`.
    pub async fn retrieve(&self, asset: &Asset) -> Result<ByteStream, AppError> {
        self.storage
            .retrieve(asset.storage_key())
            .await
            .map_err(|e| {
                if matches!(e, StorageError::NotFound(_)) {
                    tracing::error!(
                        asset_id = %asset.id(),
                        storage_key = %asset.storage_key(),
                        "Asset record points at a missing blob"
                    );
                }
                AppError::from(e)
            })
    }

    /// Read the asset's whole content into memory.
    pub async fn read_to_bytes(&self, asset: &Asset) -> Result<Bytes, AppError> {
        let mut stream = self.retrieve(asset).await?;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }
}
