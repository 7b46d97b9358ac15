//! Metadata store abstraction
//!
//! The asset coordinator only sees this trait, so it can run against PostgreSQL or the
//! in-memory store without change.

use async_trait::async_trait;
use gallery_core::{AppError, Asset};
use uuid::Uuid;

/// Listings are newest first by `created_at`; records created at the same instant are listed
/// most recently inserted first.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Asset>, AppError>;

    /// The record only if it exists and belongs to `owner_id`.
    async fn find_by_id_and_owner(&self, id: Uuid, owner_id: Uuid)
        -> Result<Option<Asset>, AppError>;

    /// All records of one owner, newest first.
    async fn find_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, AppError>;

    /// Records whose title or description contains `fragment`, ignoring case. Newest first.
    async fn find_all_by_fragment(&self, fragment: &str) -> Result<Vec<Asset>, AppError>;

    async fn find_all_by_owner_and_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> Result<Vec<Asset>, AppError>;

    /// Every record, newest first.
    async fn find_all_ordered(&self) -> Result<Vec<Asset>, AppError>;

    /// Insert, or update title/description/updated_at of an existing record with the same id.
    async fn save(&self, asset: &Asset) -> Result<Asset, AppError>;

    /// Write title/description/updated_at onto an existing record. Never inserts; `None`
    /// when no record with this id exists.
    async fn update(&self, asset: &Asset) -> Result<Option<Asset>, AppError>;

    /// Remove the record with this id. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
