//! Test helpers: collaborators with switchable failures.
//!
//! Run with `cargo test -p gallery-services`.

pub mod faults;

use faults::{FlakyAssetStore, FlakyStorage};
use gallery_core::UploadPolicy;
use gallery_services::{AssetService, MemoryAssetStore, MemoryStorage};
use std::sync::Arc;

/// A coordinator over in-memory stores, with handles to inspect and break them.
pub struct Harness {
    pub service: AssetService,
    pub blobs: MemoryStorage,
    pub records: MemoryAssetStore,
    pub storage_faults: FlakyStorage,
    pub store_faults: FlakyAssetStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(UploadPolicy::default())
    }

    pub fn with_policy(policy: UploadPolicy) -> Self {
        let blobs = MemoryStorage::new(policy);
        let records = MemoryAssetStore::new();
        let storage_faults = FlakyStorage::new(Arc::new(blobs.clone()));
        let store_faults = FlakyAssetStore::new(Arc::new(records.clone()));
        let service = AssetService::new(
            Arc::new(storage_faults.clone()),
            Arc::new(store_faults.clone()),
        );
        Self {
            service,
            blobs,
            records,
            storage_faults,
            store_faults,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
