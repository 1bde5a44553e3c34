//! Error responses.
//!
//! Every failure leaves the API as
//! `{"success": false, "error": <code>, "message": <text>}` with the status
//! code from [`AppError::status_code`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};

use codedrop_core::TransferError;
use codedrop_shared::AppError;

/// Failure body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// An [`AppError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_server_error() {
            error!(error = %err, code = err.error_code(), "Request failed");
        } else {
            debug!(error = %err, code = err.error_code(), "Request rejected");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            success: false,
            error: err.error_code(),
            message: err.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Fallback for methods an endpoint does not support.
pub async fn method_not_allowed() -> ApiError {
    ApiError(AppError::MethodNotAllowed)
}
