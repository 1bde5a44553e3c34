//! Blob store error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Blob store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Every candidate code was held by a live record.
    #[error("no free share code after {attempts} attempts")]
    CapacityExhausted {
        /// Number of candidate codes tried.
        attempts: u32,
    },

    /// Expiry must be strictly after the upload time.
    #[error("expiry time {expiry_time} is not after upload time {upload_time}")]
    InvalidExpiry {
        /// Requested upload time.
        upload_time: DateTime<Utc>,
        /// Requested expiry time.
        expiry_time: DateTime<Utc>,
    },

    /// Backend could not be initialized.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Backend I/O failure.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

impl From<opendal::Error> for StoreError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unavailable(format!("metadata encoding: {err}"))
    }
}
