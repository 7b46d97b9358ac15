//! Application-wide constants.

/// Display name recorded for uploads that carry no original filename.
pub const UNTITLED_FILENAME: &str = "untitled";

/// Content type recorded for uploads that declare none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content types accepted by the blob store when `ALLOWED_CONTENT_TYPES` is unset.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Upload size cap when `MAX_FILE_SIZE_MB` is unset.
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;

/// Prefix for every storage key written by the blob backends.
pub const STORAGE_KEY_PREFIX: &str = "assets";

