//! Transfer error types.

use codedrop_shared::AppError;
use thiserror::Error;

use crate::store::StoreError;

/// Upload and download errors.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The request carried no file.
    #[error("no file provided")]
    NoFileProvided,

    /// The file is unusable.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// The file exceeds the configured maximum.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Unknown, expired, or malformed code.
    #[error("file not found")]
    NotFound,

    /// Blob store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl TransferError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an invalid file error.
    #[must_use]
    pub fn invalid_file(reason: impl Into<String>) -> Self {
        Self::InvalidFile(reason.into())
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::NoFileProvided => Self::NoFileProvided,
            TransferError::InvalidFile(reason) => Self::InvalidFile(reason),
            TransferError::FileTooLarge { size, max } => Self::FileTooLarge { size, max },
            TransferError::NotFound => Self::NotFound,
            TransferError::Store(StoreError::CapacityExhausted { attempts }) => {
                Self::CapacityExhausted { attempts }
            }
            TransferError::Store(StoreError::Unavailable(msg)) => Self::StorageUnavailable(msg),
            TransferError::Store(other) => Self::Internal(other.to_string()),
        }
    }
}
