//! In-process metadata store.
//!
//! Same contract as [`AssetRepository`](super::AssetRepository). Records sharing a
//! `created_at` are listed most recently inserted first.

use async_trait::async_trait;
use gallery_core::{AppError, Asset};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::traits::AssetStore;

#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    // Insertion order; updates keep their original slot.
    assets: Arc<RwLock<Vec<Asset>>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }

    async fn collect_newest_first<F>(&self, keep: F) -> Vec<Asset>
    where
        F: Fn(&Asset) -> bool,
    {
        let assets = self.assets.read().await;
        let mut selected: Vec<Asset> = assets.iter().rev().filter(|a| keep(a)).cloned().collect();
        // Stable: ties stay in reverse insertion order.
        selected.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        selected
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Asset>, AppError> {
        Ok(self
            .assets
            .read()
            .await
            .iter()
            .find(|a| a.id() == id)
            .cloned())
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Asset>, AppError> {
        Ok(self
            .assets
            .read()
            .await
            .iter()
            .find(|a| a.id() == id && a.is_owned_by(owner_id))
            .cloned())
    }

    async fn find_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, AppError> {
        Ok(self.collect_newest_first(|a| a.is_owned_by(owner_id)).await)
    }

    async fn find_all_by_fragment(&self, fragment: &str) -> Result<Vec<Asset>, AppError> {
        Ok(self
            .collect_newest_first(|a| a.matches_fragment(fragment))
            .await)
    }

    async fn find_all_by_owner_and_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> Result<Vec<Asset>, AppError> {
        Ok(self
            .collect_newest_first(|a| a.is_owned_by(owner_id) && a.matches_fragment(fragment))
            .await)
    }

    async fn find_all_ordered(&self) -> Result<Vec<Asset>, AppError> {
        Ok(self.collect_newest_first(|_| true).await)
    }

    async fn save(&self, asset: &Asset) -> Result<Asset, AppError> {
        let mut assets = self.assets.write().await;

        if let Some(existing) = assets.iter_mut().find(|a| a.id() == asset.id()) {
            existing.apply_edits_from(asset);
            return Ok(existing.clone());
        }

        if assets.iter().any(|a| a.storage_key() == asset.storage_key()) {
            return Err(AppError::Persistence(format!(
                "storage key {} is already referenced",
                asset.storage_key()
            )));
        }

        assets.push(asset.clone());
        Ok(asset.clone())
    }

    async fn update(&self, asset: &Asset) -> Result<Option<Asset>, AppError> {
        let mut assets = self.assets.write().await;
        Ok(assets.iter_mut().find(|a| a.id() == asset.id()).map(|existing| {
            existing.apply_edits_from(asset);
            existing.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut assets = self.assets.write().await;
        let before = assets.len();
        assets.retain(|a| a.id() != id);
        Ok(assets.len() < before)
    }
}
