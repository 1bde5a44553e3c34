//! Shared fixtures for route tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header::CONTENT_TYPE},
};
use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use codedrop_core::{
    BlobStore, Clock, FileRecord, ManualClock, RandomCodeGenerator, StoreError, TransferService,
    store::{MemoryBlobStore, NewBlob},
    transfer::{DownloadPolicy, IncomingFile},
};
use codedrop_shared::ShareCode;
use http_body_util::BodyExt;

use crate::{AppState, create_router};

pub const BOUNDARY: &str = "codedrop-test-boundary";

/// A router over an in-memory store and a manual clock.
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::configured(|service| service)
    }

    pub fn configured(configure: impl FnOnce(TransferService) -> TransferService) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(MemoryBlobStore::new(Arc::new(RandomCodeGenerator)));
        let service = configure(TransferService::new(store, clock.clone()));
        Self {
            state: AppState::new(service),
            clock,
        }
    }

    pub fn with_max_file_size(max: u64) -> Self {
        Self::configured(|service| service.with_max_file_size(max))
    }

    pub fn one_time() -> Self {
        Self::configured(|service| service.with_download_policy(DownloadPolicy::OneTime))
    }

    pub fn unavailable() -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let service = TransferService::new(Arc::new(UnavailableStore), clock.clone());
        Self {
            state: AppState::new(service),
            clock,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn advance_hours(&self, hours: i64) {
        self.clock.advance(Duration::hours(hours));
    }

    /// Uploads directly through the service and returns the code.
    pub async fn seed(&self, filename: &str, content: &[u8], duration: &str) -> String {
        let file = IncomingFile {
            filename: filename.to_string(),
            content_type: Some("text/plain".to_string()),
            content: Bytes::copy_from_slice(content),
        };
        self.state
            .transfer
            .upload(Some(file), Some(duration))
            .await
            .unwrap()
            .code
            .into_inner()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
}

/// One part of a multipart body.
pub enum Part<'a> {
    File {
        filename: &'a str,
        content_type: &'a str,
        content: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                filename,
                content_type,
                content,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    raw_upload_request(multipart_body(parts))
}

pub fn raw_upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// A store whose backend is always down.
pub struct UnavailableStore;

#[async_trait]
impl BlobStore for UnavailableStore {
    async fn put(
        &self,
        _blob: NewBlob,
        _expiry_time: DateTime<Utc>,
        _now: DateTime<Utc>,
    ) -> Result<ShareCode, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn get(
        &self,
        _code: &ShareCode,
        _now: DateTime<Utc>,
    ) -> Result<Option<FileRecord>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn purge(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn delete(&self, _code: &ShareCode) -> Result<bool, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn live_count(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}
