//! Upload endpoint.
//!
//! `POST /api/upload` takes a multipart body with one file part (the first
//! part carrying a filename) and an optional `duration` field.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
    routing::post,
};
use bytes::{Bytes, BytesMut};
use chrono::SecondsFormat;
use serde::Serialize;
use tracing::debug;

use codedrop_core::transfer::{IncomingFile, TransferError};

use crate::{
    AppState,
    error::{ApiError, method_not_allowed},
    middleware::CorsPolicy,
};

/// Room for multipart boundaries, part headers and the `duration` field on
/// top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Successful upload response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Share code for the file.
    pub code: String,
    /// RFC 3339 expiry timestamp.
    pub expiry_time: String,
}

/// Creates upload routes.
pub fn routes(max_file_size: u64) -> Router<AppState> {
    let router = Router::new()
        .route("/upload", post(upload).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(body_limit(max_file_size)));
    CorsPolicy::UPLOAD.apply(router)
}

fn body_limit(max_file_size: u64) -> usize {
    usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD)
}

/// Upload handler.
async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "Upload without a multipart body");
        TransferError::NoFileProvided
    })?;

    let max = state.transfer.max_file_size();
    let mut file = None;
    let mut duration = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, max))?
    {
        if field.name() == Some("duration") {
            duration = Some(field.text().await.map_err(|e| multipart_error(&e, max))?);
            continue;
        }

        if file.is_some() {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);
        let content = read_capped(&mut field, max).await?;

        file = Some(IncomingFile {
            filename,
            content_type,
            content,
        });
    }

    let receipt = state
        .transfer
        .upload(file, duration.as_deref().map(str::trim))
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        code: receipt.code.into_inner(),
        expiry_time: receipt
            .expiry_time
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// Buffers a file part, stopping as soon as it exceeds `max` bytes.
async fn read_capped(field: &mut Field<'_>, max: u64) -> Result<Bytes, TransferError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e, max))? {
        let size = (buf.len() + chunk.len()) as u64;
        if size > max {
            return Err(TransferError::file_too_large(size, max));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn multipart_error(err: &MultipartError, max: u64) -> TransferError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        TransferError::file_too_large(max.saturating_add(1), max)
    } else {
        debug!(error = %err, "Malformed multipart body");
        TransferError::invalid_file(err.body_text())
    }
}
