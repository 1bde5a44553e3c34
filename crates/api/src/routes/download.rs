//! Download endpoint.
//!
//! `GET /api/download?code=X` streams the stored bytes back as an
//! attachment. With `descriptor=true` it answers with JSON metadata and a
//! download URL instead, leaving the file in place.

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State, rejection::QueryRejection},
    http::{
        HeaderValue,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use codedrop_core::store::DEFAULT_CONTENT_TYPE;
use codedrop_core::transfer::{DownloadedFile, FileDescriptor, TransferError};

use crate::{
    AppState,
    error::{ApiError, method_not_allowed},
    middleware::CorsPolicy,
};

/// RFC 5987 `attr-char` minus alphanumerics.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

const FALLBACK_FILENAME: &str = "download";

/// Download query parameters.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Share code.
    pub code: Option<String>,
    /// `true` or `1` selects descriptor mode.
    pub descriptor: Option<String>,
}

impl DownloadQuery {
    fn wants_descriptor(&self) -> bool {
        matches!(self.descriptor.as_deref(), Some("true" | "1"))
    }
}

/// Descriptor-mode response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorResponse {
    /// Always `true`.
    pub success: bool,
    /// File metadata.
    #[serde(flatten)]
    pub file: FileDescriptor,
    /// URL returning the raw bytes.
    pub download_url: String,
}

/// Creates download routes.
pub fn routes() -> Router<AppState> {
    let router = Router::new().route("/download", get(download).fallback(method_not_allowed));
    CorsPolicy::DOWNLOAD.apply(router)
}

/// Download handler.
async fn download(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| {
        debug!(error = %e, "Unreadable download query");
        TransferError::NotFound
    })?;
    let code = query.code.as_deref().ok_or(TransferError::NotFound)?.trim();

    if query.wants_descriptor() {
        let file = state.transfer.describe(code).await?;
        let download_url = format!("/api/download?code={}", file.code);
        return Ok(Json(DescriptorResponse {
            success: true,
            file,
            download_url,
        })
        .into_response());
    }

    let file = state.transfer.download(code).await?;
    Ok(attachment(file))
}

fn attachment(file: DownloadedFile) -> Response {
    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&content_disposition(&file.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, disposition),
            (CONTENT_LENGTH, HeaderValue::from(file.content.len())),
            (CACHE_CONTROL, HeaderValue::from_static("no-store")),
            (
                axum::http::HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ),
        ],
        Body::from(file.content),
    )
        .into_response()
}

/// `attachment` disposition with a quoted ASCII fallback and an RFC 5987
/// `filename*` carrying the original name.
fn content_disposition(filename: &str) -> String {
    let filename = filename.trim();
    if filename.is_empty() {
        return format!("attachment; filename=\"{FALLBACK_FILENAME}\"");
    }

    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(filename, FILENAME_ENCODE_SET);

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
