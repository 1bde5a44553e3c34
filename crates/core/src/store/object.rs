//! Blob store on top of Apache OpenDAL.
//!
//! Each record is two objects:
//!
//! - `blobs/{code}`: the raw file bytes;
//! - `meta/{code}.json`: filename, content type, size, upload and expiry
//!   times.
//!
//! The metadata object is written last and is the commit marker: a blob
//! without metadata is invisible and gets overwritten by the next upload that
//! draws the same code. Writers (`put`, `delete`, `purge`) serialize on a
//! store-wide mutex, so the code uniqueness check and the insert form one
//! critical section within this process. Readers do not take the lock.
//!
//! Live counts come from an in-process expiry index, loaded from the stored
//! metadata on first use and kept current by this store's own writes.
//! Another process writing to the same bucket is not reflected until restart.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use codedrop_shared::ShareCode;
use codedrop_shared::config::StorageConfig;
use dashmap::DashMap;
use opendal::{Builder, Entry, ErrorKind, Operator, services};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use super::{BlobStore, FileRecord, MAX_PUT_ATTEMPTS, NewBlob, StoreError, check_expiry};
use crate::code::CodeGenerator;

const BLOB_PREFIX: &str = "blobs/";
const META_PREFIX: &str = "meta/";
const META_SUFFIX: &str = ".json";

/// Persisted metadata for one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMetadata {
    code: ShareCode,
    filename: String,
    content_type: String,
    size: u64,
    upload_time: DateTime<Utc>,
    expiry_time: DateTime<Utc>,
}

impl StoredMetadata {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry_time
    }

    fn into_record(self, content: Bytes) -> FileRecord {
        FileRecord {
            code: self.code,
            filename: self.filename,
            content_type: self.content_type,
            content,
            size: self.size,
            upload_time: self.upload_time,
            expiry_time: self.expiry_time,
        }
    }
}

fn blob_key(code: &ShareCode) -> String {
    format!("{BLOB_PREFIX}{code}")
}

fn meta_key(code: &ShareCode) -> String {
    format!("{META_PREFIX}{code}{META_SUFFIX}")
}

/// Recovers the share code from a metadata entry name.
fn code_from_meta_name(name: &str) -> Option<ShareCode> {
    name.strip_suffix(META_SUFFIX)
        .and_then(|raw| ShareCode::parse(raw).ok())
}

/// Blob store writing to any OpenDAL operator.
pub struct ObjectBlobStore {
    operator: Operator,
    codes: Arc<dyn CodeGenerator>,
    write_lock: Mutex<()>,
    expiries: DashMap<ShareCode, DateTime<Utc>>,
    index_loaded: OnceCell<()>,
    backend: &'static str,
}

impl ObjectBlobStore {
    /// Wraps an existing operator.
    #[must_use]
    pub fn new(operator: Operator, backend: &'static str, codes: Arc<dyn CodeGenerator>) -> Self {
        Self {
            operator,
            codes,
            write_lock: Mutex::new(()),
            expiries: DashMap::new(),
            index_loaded: OnceCell::new(),
            backend,
        }
    }

    /// Creates a store from storage configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(
        config: &StorageConfig,
        codes: Arc<dyn CodeGenerator>,
    ) -> Result<Self, StoreError> {
        let operator = create_operator(config)?;
        Ok(Self::new(operator, config.name(), codes))
    }

    /// Reads metadata for `code`. Missing or undecodable metadata reads as
    /// absent.
    async fn read_metadata(&self, code: &ShareCode) -> Result<Option<StoredMetadata>, StoreError> {
        let buffer = match self.operator.read(&meta_key(code)).await {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&buffer.to_vec()) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                warn!(code = %code, error = %e, "Ignoring undecodable metadata");
                Ok(None)
            }
        }
    }

    /// Removes both objects for `code`.
    async fn remove_objects(&self, code: &ShareCode) -> Result<(), StoreError> {
        // Metadata first, so a failure halfway leaves an invisible blob
        // rather than a visible record without content.
        self.operator.delete(&meta_key(code)).await?;
        self.expiries.remove(code);
        self.operator.delete(&blob_key(code)).await?;
        Ok(())
    }

    async fn object_exists(&self, path: &str) -> Result<bool, StoreError> {
        match self.operator.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists entries under `prefix`, treating a missing prefix as empty.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<Entry>, StoreError> {
        match self.operator.list(prefix).await {
            Ok(entries) => Ok(entries),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes blobs that have no metadata object. These are left behind by
    /// uploads interrupted between the two writes. Caller holds `write_lock`.
    async fn remove_orphan_blobs(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for entry in self.list_prefix(BLOB_PREFIX).await? {
            let Ok(code) = ShareCode::parse(entry.name()) else {
                continue;
            };
            if !self.object_exists(&meta_key(&code)).await? {
                self.operator.delete(&blob_key(&code)).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Fills the expiry index from stored metadata.
    async fn load_index(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        for entry in self.list_prefix(META_PREFIX).await? {
            let Some(code) = code_from_meta_name(entry.name()) else {
                continue;
            };
            if let Some(meta) = self.read_metadata(&code).await? {
                self.expiries.insert(code, meta.expiry_time);
            }
        }

        debug!(indexed = self.expiries.len(), backend = self.backend, "Loaded expiry index");
        Ok(())
    }

    async fn write_record(
        &self,
        meta: &StoredMetadata,
        content: Bytes,
    ) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(meta)?;

        self.operator.write(&blob_key(&meta.code), content).await?;

        if let Err(e) = self.operator.write(&meta_key(&meta.code), encoded).await {
            // Without metadata the blob is unreachable; try to reclaim it.
            if let Err(cleanup) = self.operator.delete(&blob_key(&meta.code)).await {
                warn!(code = %meta.code, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e.into());
        }

        Ok(())
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn put(
        &self,
        blob: NewBlob,
        expiry_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ShareCode, StoreError> {
        check_expiry(expiry_time, now)?;

        let _guard = self.write_lock.lock().await;

        for attempt in 1..=MAX_PUT_ATTEMPTS {
            let code = self.codes.generate();

            if let Some(existing) = self.read_metadata(&code).await? {
                if existing.is_live(now) {
                    debug!(attempt, "Share code collision, retrying");
                    continue;
                }
            }

            let meta = StoredMetadata {
                code: code.clone(),
                filename: blob.filename,
                content_type: blob.content_type,
                size: blob.content.len() as u64,
                upload_time: now,
                expiry_time,
            };
            self.write_record(&meta, blob.content).await?;
            self.expiries.insert(code.clone(), expiry_time);

            return Ok(code);
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
        let Some(meta) = self.read_metadata(code).await? else {
            return Ok(None);
        };
        if !meta.is_live(now) {
            return Ok(None);
        }

        match self.operator.read(&blob_key(code)).await {
            Ok(buffer) => Ok(Some(meta.into_record(buffer.to_bytes()))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(code = %code, "Metadata present but blob missing");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut removed = 0;
        for entry in self.list_prefix(META_PREFIX).await? {
            let Some(code) = code_from_meta_name(entry.name()) else {
                continue;
            };
            let expired = match self.read_metadata(&code).await? {
                Some(meta) => !meta.is_live(now),
                // Undecodable metadata can never be served; reclaim it.
                None => true,
            };
            if expired {
                self.remove_objects(&code).await?;
                removed += 1;
            }
        }

        let orphans = self.remove_orphan_blobs().await?;
        if orphans > 0 {
            warn!(orphans, "Removed blobs without metadata");
        }

        Ok(removed)
    }

    async fn delete(&self, code: &ShareCode) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;

        let exists = self.object_exists(&meta_key(code)).await?;
        if exists {
            self.remove_objects(code).await?;
        }

        Ok(exists)
    }

    async fn live_count(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.index_loaded.get_or_try_init(|| self.load_index()).await?;
        Ok(self
            .expiries
            .iter()
            .filter(|entry| now < *entry.value())
            .count())
    }

    fn backend_name(&self) -> &'static str {
        self.backend
    }
}

/// Create an OpenDAL operator from storage configuration.
fn create_operator(config: &StorageConfig) -> Result<Operator, StoreError> {
    match config {
        StorageConfig::Memory => finish(services::Memory::default()),
        StorageConfig::LocalFs { root } => {
            let root = root
                .to_str()
                .ok_or_else(|| StoreError::configuration("invalid path"))?;
            finish(services::Fs::default().root(root))
        }
        StorageConfig::S3 {
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        } => finish(
            services::S3::default()
                .endpoint(endpoint)
                .bucket(bucket)
                .access_key_id(access_key_id)
                .secret_access_key(secret_access_key)
                .region(region),
        ),
    }
}

fn finish(builder: impl Builder) -> Result<Operator, StoreError> {
    Ok(Operator::new(builder)
        .map_err(|e| StoreError::configuration(e.to_string()))?
        .finish())
}
