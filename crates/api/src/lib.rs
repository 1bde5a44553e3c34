//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - Upload and download routes
//! - Per-endpoint CORS layers
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use codedrop_core::TransferService;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload and download service.
    pub transfer: Arc<TransferService>,
}

impl AppState {
    /// Creates state around a transfer service.
    #[must_use]
    pub fn new(transfer: TransferService) -> Self {
        Self {
            transfer: Arc::new(transfer),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api", routes::api_routes(&state))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
