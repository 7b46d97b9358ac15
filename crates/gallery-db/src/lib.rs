//! Gallery Database Layer
//!
//! The metadata side of an asset: the [`AssetStore`] trait, its PostgreSQL implementation and
//! an in-process implementation for tests and local runs.

pub mod db;
pub mod traits;

pub use db::{connect, run_migrations, setup_database, AssetRepository, MemoryAssetStore};
pub use traits::AssetStore;
