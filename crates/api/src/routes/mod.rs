//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod download;
pub mod health;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

/// Creates the `/api` router with the transfer endpoints.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(upload::routes(state.transfer.max_file_size()))
        .merge(download::routes())
}
