//! Data models for the application

mod asset;
mod query;
mod upload;

pub use asset::{Asset, AssetPatch};
pub use query::AssetQuery;
pub use upload::UploadedFile;
