//! Core logic for Codedrop.
//!
//! This crate holds the code-addressed, time-limited blob store and the
//! request lifecycle around it, with no web dependencies.
//!
//! # Modules
//!
//! - `code` - Share code generation
//! - `expiry` - Retention windows and expiry resolution
//! - `clock` - Time source abstraction
//! - `store` - Blob store contract and backends
//! - `transfer` - Upload and download services
//! - `sweeper` - Background purge of expired files

pub mod clock;
pub mod code;
pub mod expiry;
pub mod store;
pub mod sweeper;
pub mod transfer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use code::{CodeGenerator, RandomCodeGenerator};
pub use expiry::RetentionWindow;
pub use store::{BlobStore, FileRecord, StoreError};
pub use sweeper::Sweeper;
pub use transfer::{TransferError, TransferService};
