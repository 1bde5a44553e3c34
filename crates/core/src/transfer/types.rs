//! Transfer types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use codedrop_shared::ShareCode;
use serde::Serialize;

use crate::store::FileRecord;

/// A file as received from the client, before validation.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Original filename.
    pub filename: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    /// File bytes.
    pub content: Bytes,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Share code for the upload.
    pub code: ShareCode,
    /// When the file stops being downloadable.
    pub expiry_time: DateTime<Utc>,
    /// Stored size in bytes.
    pub size: u64,
}

/// A file handed back to a downloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Exact uploaded bytes.
    pub content: Bytes,
}

impl From<FileRecord> for DownloadedFile {
    fn from(record: FileRecord) -> Self {
        Self {
            filename: record.filename,
            content_type: record.content_type,
            content: record.content,
        }
    }
}

/// Metadata for a live upload, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Share code.
    pub code: ShareCode,
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// When the file was uploaded.
    pub upload_time: DateTime<Utc>,
    /// When the file stops being downloadable.
    pub expiry_time: DateTime<Utc>,
}

impl From<FileRecord> for FileDescriptor {
    fn from(record: FileRecord) -> Self {
        Self {
            code: record.code,
            filename: record.filename,
            content_type: record.content_type,
            size: record.size,
            upload_time: record.upload_time,
            expiry_time: record.expiry_time,
        }
    }
}

/// What happens to a file once it has been downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadPolicy {
    /// Downloadable any number of times until it expires.
    #[default]
    UntilExpiry,
    /// Deleted by the first successful download.
    OneTime,
}

impl DownloadPolicy {
    /// Policy from the `download.one_time` configuration flag.
    #[must_use]
    pub fn from_one_time(one_time: bool) -> Self {
        if one_time { Self::OneTime } else { Self::UntilExpiry }
    }
}
