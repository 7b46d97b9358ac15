//! Gallery Services Layer
//!
//! Hosts the asset coordinator, the only component that touches the blob store and the
//! metadata store together, and re-exports the collaborator types callers need to build it.

pub mod services;

pub use gallery_db::{AssetRepository, AssetStore, MemoryAssetStore};
pub use gallery_storage::{
    create_storage, ByteStream, MemoryStorage, Storage, StorageBackend, StorageError,
    StorageResult,
};
pub use services::AssetService;
