//! Application-wide error types.
//!
//! Every failure that reaches a client is expressed as an [`AppError`]. The
//! `Display` text may carry internal detail for logs; clients only ever see
//! [`AppError::error_code`] and [`AppError::public_message`].

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// The upload request carried no file part.
    #[error("No file provided")]
    NoFileProvided,

    /// The uploaded file is unusable (empty, unreadable multipart body).
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// The uploaded file exceeds the configured ceiling.
    #[error("File too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual size in bytes (a lower bound if the body was cut off).
        size: u64,
        /// Configured maximum in bytes.
        max: u64,
    },

    /// Unknown, expired, or malformed share code.
    #[error("Not found")]
    NotFound,

    /// No free share code could be found within the retry budget.
    #[error("Share code space exhausted after {attempts} attempts")]
    CapacityExhausted {
        /// Number of candidate codes tried.
        attempts: u32,
    },

    /// The blob backend failed.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// HTTP method not supported by the endpoint.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NoFileProvided | Self::InvalidFile(_) => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::FileTooLarge { .. } => 413,
            Self::CapacityExhausted { .. } | Self::StorageUnavailable(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the machine-readable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoFileProvided => "no_file_provided",
            Self::InvalidFile(_) => "invalid_file",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::NotFound => "not_found",
            Self::CapacityExhausted { .. } => "capacity_exhausted",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the message shown to clients.
    ///
    /// Never includes backend error text, and never tells a downloader
    /// whether a code once existed.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NoFileProvided => "No file uploaded".to_string(),
            Self::InvalidFile(reason) => format!("Invalid file: {reason}"),
            Self::FileTooLarge { max, .. } => {
                format!("File is too large; the maximum size is {max} bytes")
            }
            Self::NotFound => "File not found or expired".to_string(),
            Self::CapacityExhausted { .. } => {
                "Could not allocate a share code, please try again".to_string()
            }
            Self::StorageUnavailable(_) => {
                "Storage is temporarily unavailable, please try again".to_string()
            }
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::Internal(_) => "Server error".to_string(),
        }
    }

    /// True for errors caused by the server rather than the request.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}
