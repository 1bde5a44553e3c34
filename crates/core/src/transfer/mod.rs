//! Upload and download services.
//!
//! This module owns the request lifecycle around the blob store:
//! - Upload validation (presence, emptiness, size ceiling)
//! - Retention window resolution
//! - Share code lookup with a single not-found outcome
//! - Download policy (until expiry, or one-time)

mod error;
mod service;
mod types;


pub use error::TransferError;
pub use service::{DEFAULT_MAX_FILE_SIZE, TransferService};
pub use types::{DownloadPolicy, DownloadedFile, FileDescriptor, IncomingFile, UploadReceipt};
