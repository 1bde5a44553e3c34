//! Code-addressed, time-limited blob store.
//!
//! The store is the only shared mutable state in the system. It owns every
//! [`FileRecord`] and enforces two invariants:
//!
//! - a share code is held by at most one live record;
//! - a record whose expiry has passed is invisible to readers, whether or
//!   not it has been purged yet.
//!
//! # Backends
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────┐
//! │ MemoryBlobStore              │ ObjectBlobStore                      │
//! │ DashMap entry compare+insert │ OpenDAL: fs, S3-compatible, memory   │
//! │ lost on restart              │ blobs/{code} + meta/{code}.json      │
//! └──────────────────────────────┴──────────────────────────────────────┘
//! ```

mod error;
mod memory;
mod object;
mod record;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use codedrop_shared::ShareCode;
use codedrop_shared::config::StorageConfig;

use crate::code::CodeGenerator;

pub use error::StoreError;
pub use memory::MemoryBlobStore;
pub use object::ObjectBlobStore;
pub use record::{DEFAULT_CONTENT_TYPE, FileRecord, NewBlob};

/// Candidate codes tried by `put` before giving up.
pub const MAX_PUT_ATTEMPTS: u32 = 10;

/// Storage contract for uploaded files.
///
/// Implementations must make the uniqueness check and insert in `put` a
/// single critical section with respect to every other operation.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a blob under a freshly generated code and returns the code.
    ///
    /// Retries on collision with a live record, at most
    /// [`MAX_PUT_ATTEMPTS`] times.
    async fn put(
        &self,
        blob: NewBlob,
        expiry_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ShareCode, StoreError>;

    /// Returns the record for `code` if it exists and `now < expiry_time`.
    async fn get(
        &self,
        code: &ShareCode,
        now: DateTime<Utc>,
    ) -> Result<Option<FileRecord>, StoreError>;

    /// Removes every record with `expiry_time <= now`, returning how many
    /// were removed.
    async fn purge(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Removes `code` regardless of expiry. Returns `false` if nothing was
    /// stored under it.
    async fn delete(&self, code: &ShareCode) -> Result<bool, StoreError>;

    /// Number of live records at `now`.
    async fn live_count(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Builds the blob store selected by configuration.
///
/// # Errors
///
/// Returns an error if the object storage provider cannot be initialized.
pub fn from_config(
    config: &StorageConfig,
    codes: Arc<dyn CodeGenerator>,
) -> Result<Arc<dyn BlobStore>, StoreError> {
    let store: Arc<dyn BlobStore> = match config {
        StorageConfig::Memory => Arc::new(MemoryBlobStore::new(codes)),
        other => Arc::new(ObjectBlobStore::from_config(other, codes)?),
    };
    Ok(store)
}

/// Rejects an expiry that is not strictly after `now`.
fn check_expiry(expiry_time: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), StoreError> {
    if expiry_time <= now {
        return Err(StoreError::InvalidExpiry {
            upload_time: now,
            expiry_time,
        });
    }
    Ok(())
}
