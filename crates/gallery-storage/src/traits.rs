//! Storage abstraction trait
//!
//! This module defines the Storage trait that all blob backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use gallery_core::{AppError, PolicyViolation, UploadPolicy, UploadedFile};
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Content type not accepted: {0}")]
    RejectedContentType(String),

    #[error("Payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether the payload was refused by policy rather than failing in transfer.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StorageError::RejectedContentType(_) | StorageError::PayloadTooLarge { .. }
        )
    }
}

impl From<PolicyViolation> for StorageError {
    fn from(violation: PolicyViolation) -> Self {
        match violation {
            PolicyViolation::ContentType(content_type) => {
                StorageError::RejectedContentType(content_type)
            }
            PolicyViolation::TooLarge { size, max } => StorageError::PayloadTooLarge { size, max },
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RejectedContentType(content_type) => {
                AppError::RejectedContent { content_type }
            }
            StorageError::PayloadTooLarge { size, max } => AppError::PayloadTooLarge(format!(
                "File size {} bytes exceeds maximum of {} bytes",
                size, max
            )),
            StorageError::NotFound(key) => AppError::BlobNotFound(key),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob content as a stream of chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// All blob backends (S3, local filesystem, memory) implement this trait so the asset
/// coordinator never depends on a concrete backend. The key returned by [`Storage::store`] is
/// opaque to callers; it is only ever handed back to the same backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check the payload against the backend's policy, write it, and return its storage key.
    ///
    /// A refused payload yields `RejectedContentType` or `PayloadTooLarge` and nothing is
    /// written.
    async fn store(&self, owner_id: Uuid, upload: &UploadedFile) -> StorageResult<String>;

    /// Open the blob at `storage_key` as a stream. A missing blob is `NotFound`.
    async fn retrieve(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Delete the blob at `storage_key`
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a blob exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the size in bytes of a blob, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Acceptance policy enforced by `store`
    fn policy(&self) -> &UploadPolicy;
}

/// Shared admission step for `store` implementations.
pub(crate) fn admit(policy: &UploadPolicy, upload: &UploadedFile) -> StorageResult<()> {
    policy
        .check(upload.declared_content_type(), upload.size())
        .map_err(|violation| {
            tracing::warn!(
                content_type = upload.declared_content_type().unwrap_or_default(),
                size_bytes = upload.size(),
                reason = %violation,
                "Upload rejected by storage policy"
            );
            StorageError::from(violation)
        })
}
