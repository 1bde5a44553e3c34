//! Stored file records.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use codedrop_shared::ShareCode;

/// Content type recorded when the uploader did not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file about to be stored.
#[derive(Debug, Clone)]
pub struct NewBlob {
    /// Original filename.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File bytes.
    pub content: Bytes,
}

impl NewBlob {
    /// Creates a blob, substituting [`DEFAULT_CONTENT_TYPE`] for a missing or
    /// blank content type.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, content: Bytes) -> Self {
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        Self {
            filename: filename.into(),
            content_type,
            content,
        }
    }
}

/// An uploaded file as held by the store. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Share code.
    pub code: ShareCode,
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Exact uploaded bytes.
    pub content: Bytes,
    /// Byte length of `content`.
    pub size: u64,
    /// When the upload was stored.
    pub upload_time: DateTime<Utc>,
    /// First instant at which the record is gone.
    pub expiry_time: DateTime<Utc>,
}

impl FileRecord {
    pub(crate) fn new(
        code: ShareCode,
        blob: NewBlob,
        upload_time: DateTime<Utc>,
        expiry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            size: blob.content.len() as u64,
            filename: blob.filename,
            content_type: blob.content_type,
            content: blob.content,
            upload_time,
            expiry_time,
        }
    }

    /// True while `now` is before the expiry time.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry_time
    }
}
