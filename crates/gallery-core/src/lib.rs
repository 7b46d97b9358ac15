//! Gallery Core Library
//!
//! Domain models, error types, configuration and upload validation shared by every gallery
//! crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, Fault, LogLevel};
pub use models::{Asset, AssetPatch, AssetQuery, UploadedFile};
pub use storage_types::StorageBackend;
pub use validation::{PolicyViolation, UploadPolicy};
