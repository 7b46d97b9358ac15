//! Gallery Storage Library
//!
//! The blob side of an asset: the [`Storage`] trait plus filesystem, S3 and in-memory
//! implementations.
//!
//! # Storage key format
//!
//! Every backend writes under `assets/{owner_id}/{uuid}{.ext}`. The UUID is fresh per write,
//! so two uploads never share a key. Keys must not contain `..` or a leading `/`.
//!
//! # Upload policy
//!
//! Each backend is built with an [`UploadPolicy`] and refuses payloads outside it before any
//! byte is written, reporting [`StorageError::RejectedContentType`] or
//! [`StorageError::PayloadTooLarge`].

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use gallery_core::{StorageBackend, UploadPolicy};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
