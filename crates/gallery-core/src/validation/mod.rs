//! Validation modules

pub mod content_type;

pub use content_type::{normalize_content_type, PolicyViolation, UploadPolicy};
