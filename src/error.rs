//! Error types for filedrive.

use std::fmt;

use thiserror::Error;

/// Common error type for filedrive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Malformed input (missing name, unparsable identifier, unknown item kind).
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced file, folder or blob does not exist or is excluded by the view rules.
    #[error("{0} not found")]
    NotFound(String),

    /// The blob store rejected a write.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// The blob store could not produce a readable stream for a key the catalog references.
    ///
    /// This indicates that catalog and blob store have diverged.
    #[error("read failure: {0}")]
    ReadFailure(String),

    /// The upload would push usage above the configured quota.
    #[error("quota exceeded: {used} of {limit} bytes used")]
    QuotaExceeded {
        /// Bytes in use if the upload were accepted.
        used: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Database error.
    ///
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DriveError {
    /// Stable tag describing the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriveError::Validation(_) => ErrorKind::ValidationFailed,
            DriveError::NotFound(_) => ErrorKind::NotFound,
            DriveError::WriteFailure(_) => ErrorKind::WriteFailed,
            DriveError::ReadFailure(_) => ErrorKind::ReadFailed,
            DriveError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            DriveError::Database(_) | DriveError::Io(_) | DriveError::Config(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Stable error classification shared by the core and the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationFailed,
    NotFound,
    WriteFailed,
    ReadFailed,
    QuotaExceeded,
    Internal,
}

impl ErrorKind {
    /// Tag string used in logs and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::WriteFailed => "WRITE_FAILED",
            ErrorKind::ReadFailed => "READ_FAILED",
            ErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for DriveError {
    fn from(e: sqlx::Error) -> Self {
        DriveError::Database(e.to_string())
    }
}

/// Result type alias for filedrive operations.
pub type Result<T> = std::result::Result<T, DriveError>;
