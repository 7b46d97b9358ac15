//! Error types module
//!
//! All failures surfaced by the asset coordinator are unified under `AppError`. Each variant
//! belongs to exactly one [`Fault`] class so callers can tell a storage transfer problem from a
//! rejected upload or a metadata persistence problem without matching on every variant.
//!
//! "Not found" and "owned by someone else" are not errors at this layer: lookups return
//! `Option` and collapse both cases into `None`.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected uploads
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Failure class of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Blob read, write or delete could not complete.
    Transfer,
    /// Upload refused by the blob store's policy (content type, size).
    RejectedContent,
    /// Metadata store could not complete a save, delete or query.
    Persistence,
    /// Caller supplied something unusable.
    Invalid,
    /// Anything else.
    Internal,
}

/// Metadata for error responses - defines how an error should be presented
/// to whatever transport sits in front of the coordinator.
pub trait ErrorMetadata {
    /// HTTP status code a transport layer should use
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from end users
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    #[error("Content type not accepted: {content_type}")]
    RejectedContent { content_type: String },

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Failure class of this error.
    pub fn fault(&self) -> Fault {
        match self {
            AppError::Storage(_) | AppError::BlobNotFound(_) => Fault::Transfer,
            AppError::RejectedContent { .. } | AppError::PayloadTooLarge(_) => {
                Fault::RejectedContent
            }
            AppError::Database(_) | AppError::Persistence(_) => Fault::Persistence,
            AppError::InvalidInput(_) | AppError::NotFound(_) => Fault::Invalid,
            AppError::Internal(_) | AppError::InternalWithSource { .. } => Fault::Internal,
        }
    }

    pub fn is_transfer_fault(&self) -> bool {
        self.fault() == Fault::Transfer
    }

    pub fn is_rejected_content(&self) -> bool {
        self.fault() == Fault::RejectedContent
    }

    pub fn is_persistence_fault(&self) -> bool {
        self.fault() == Fault::Persistence
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) | AppError::Persistence(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::BlobNotFound(_) => (
            500,
            "BLOB_NOT_FOUND",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::RejectedContent { .. } => (
            415,
            "UNSUPPORTED_CONTENT_TYPE",
            false,
            Some("Upload a file with one of the accepted content types"),
            false,
            LogLevel::Warn,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Persistence(_) => {
                "A database error occurred".to_string()
            }
            AppError::Storage(_) => "A storage error occurred".to_string(),
            AppError::BlobNotFound(_) => "Stored content is unavailable".to_string(),
            AppError::RejectedContent { content_type } => {
                format!("Content type '{}' is not accepted", content_type)
            }
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }
}
