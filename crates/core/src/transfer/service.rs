//! Transfer service implementation.

use std::sync::Arc;

use codedrop_shared::ShareCode;
use tracing::{debug, info};

use super::error::TransferError;
use super::types::{DownloadPolicy, DownloadedFile, FileDescriptor, IncomingFile, UploadReceipt};
use crate::clock::Clock;
use crate::expiry::RetentionWindow;
use crate::store::{BlobStore, FileRecord, NewBlob};

/// Default maximum upload size: 10MB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Upload and download request lifecycle around the blob store.
pub struct TransferService {
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    max_file_size: u64,
    download_policy: DownloadPolicy,
}

impl TransferService {
    /// Create a new transfer service with default limits.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            download_policy: DownloadPolicy::default(),
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set the download policy.
    #[must_use]
    pub fn with_download_policy(mut self, policy: DownloadPolicy) -> Self {
        self.download_policy = policy;
        self
    }

    /// Maximum accepted file size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Configured download policy.
    #[must_use]
    pub fn download_policy(&self) -> DownloadPolicy {
        self.download_policy
    }

    /// Underlying blob store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Validate a file against size constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty or too large.
    pub fn validate_size(&self, size: u64) -> Result<(), TransferError> {
        if size == 0 {
            return Err(TransferError::invalid_file("file is empty"));
        }
        if size > self.max_file_size {
            return Err(TransferError::file_too_large(size, self.max_file_size));
        }
        Ok(())
    }

    /// Store a file and issue a share code for it.
    ///
    /// An unrecognized or missing `duration` selects the one-hour window.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No file was provided
    /// - The file is empty or exceeds the size limit
    /// - No share code could be allocated
    /// - The blob store fails
    pub async fn upload(
        &self,
        file: Option<IncomingFile>,
        duration: Option<&str>,
    ) -> Result<UploadReceipt, TransferError> {
        let file = file.ok_or(TransferError::NoFileProvided)?;
        let size = file.content.len() as u64;
        self.validate_size(size)?;

        let now = self.clock.now();
        let window = RetentionWindow::from_token(duration);
        let expiry_time = window.expires_at(now);

        let blob = NewBlob::new(file.filename, file.content_type.as_deref(), file.content);
        let code = self.store.put(blob, expiry_time, now).await?;

        info!(
            code = %code,
            size,
            retention = window.as_token(),
            expiry_time = %expiry_time,
            "File uploaded"
        );

        Ok(UploadReceipt {
            code,
            expiry_time,
            size,
        })
    }

    /// Fetch a live file by its share code.
    ///
    /// Malformed, unknown and expired codes all yield
    /// [`TransferError::NotFound`]. Under [`DownloadPolicy::OneTime`] the
    /// first successful download removes the file; a concurrent download
    /// that loses the race sees `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unavailable or the blob store fails.
    pub async fn download(&self, raw_code: &str) -> Result<DownloadedFile, TransferError> {
        let record = self.lookup(raw_code).await?;

        if self.download_policy == DownloadPolicy::OneTime
            && !self.store.delete(&record.code).await?
        {
            debug!(code = %record.code, "Lost one-time download race");
            return Err(TransferError::NotFound);
        }

        info!(code = %record.code, size = record.size, "File downloaded");
        Ok(record.into())
    }

    /// Describe a live file without returning its content. Never consumes a
    /// one-time file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unavailable or the blob store fails.
    pub async fn describe(&self, raw_code: &str) -> Result<FileDescriptor, TransferError> {
        self.lookup(raw_code).await.map(FileDescriptor::from)
    }

    /// Remove a file before it expires.
    ///
    /// Expired files that are still awaiting a purge count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::NotFound`] if no live file holds the code.
    pub async fn revoke(&self, raw_code: &str) -> Result<(), TransferError> {
        let record = self.lookup(raw_code).await?;
        let code = record.code;
        if self.store.delete(&code).await? {
            info!(code = %code, "File revoked");
            Ok(())
        } else {
            Err(TransferError::NotFound)
        }
    }

    /// Number of files currently downloadable.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob store fails.
    pub async fn live_files(&self) -> Result<usize, TransferError> {
        Ok(self.store.live_count(self.clock.now()).await?)
    }

    async fn lookup(&self, raw_code: &str) -> Result<FileRecord, TransferError> {
        let code = parse_code(raw_code)?;
        self.store
            .get(&code, self.clock.now())
            .await?
            .ok_or(TransferError::NotFound)
    }
}

/// Malformed codes are reported exactly like unknown ones.
fn parse_code(raw: &str) -> Result<ShareCode, TransferError> {
    ShareCode::parse(raw).map_err(|e| {
        debug!(error = %e, "Rejected malformed share code");
        TransferError::NotFound
    })
}
