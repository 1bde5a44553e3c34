//! In-process blob store backed by a concurrent map.
//!
//! Nothing survives a restart. Suitable for single-instance deployments
//! where short-lived shares are acceptable to lose.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use codedrop_shared::ShareCode;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::{BlobStore, FileRecord, MAX_PUT_ATTEMPTS, NewBlob, StoreError, check_expiry};
use crate::code::CodeGenerator;

/// Blob store holding every record in memory.
pub struct MemoryBlobStore {
    records: DashMap<ShareCode, FileRecord>,
    codes: Arc<dyn CodeGenerator>,
}

impl MemoryBlobStore {
    /// Creates an empty store drawing codes from `codes`.
    #[must_use]
    pub fn new(codes: Arc<dyn CodeGenerator>) -> Self {
        Self {
            records: DashMap::new(),
            codes,
        }
    }

    /// Number of records physically held, live or not.
    #[must_use]
    pub fn stored_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        blob: NewBlob,
        expiry_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ShareCode, StoreError> {
        check_expiry(expiry_time, now)?;

        for attempt in 1..=MAX_PUT_ATTEMPTS {
            let code = self.codes.generate();

            // The entry holds the shard lock, so check and insert are atomic.
            match self.records.entry(code.clone()) {
                Entry::Occupied(mut occupied) if !occupied.get().is_live(now) => {
                    occupied.insert(FileRecord::new(code.clone(), blob, now, expiry_time));
                    return Ok(code);
                }
                Entry::Occupied(_) => {
                    debug!(attempt, "Share code collision, retrying");
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(FileRecord::new(code.clone(), blob, now, expiry_time));
                    return Ok(code);
                }
            }
        }

        Err(StoreError::CapacityExhausted {
            attempts: MAX_PUT_ATTEMPTS,
        })
    }

    async fn get(
        &self,
        code: &ShareCode,
        now: DateTime<Utc>,
    ) -> Result<Option<FileRecord>, StoreError> {
        Ok(self
            .records
            .get(code)
            .filter(|record| record.is_live(now))
            .map(|record| record.value().clone()))
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut removed = 0;
        self.records.retain(|_, record| {
            let keep = record.is_live(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn delete(&self, code: &ShareCode) -> Result<bool, StoreError> {
        Ok(self.records.remove(code).is_some())
    }

    async fn live_count(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.value().is_live(now))
            .count())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
