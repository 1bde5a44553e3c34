//! CORS for the public transfer endpoints.
//!
//! `CorsLayer` answers preflights and sets the allowed origin. The endpoint's
//! allow-methods and allow-headers values are stamped on every response, so
//! browser clients see them on errors too.

use axum::{
    Router,
    http::{
        HeaderValue,
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS},
    },
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

/// Value of `Access-Control-Allow-Headers` on every endpoint.
pub const ALLOW_HEADERS: &str = "Content-Type";

/// CORS headers for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_methods: &'static str,
}

impl CorsPolicy {
    /// Upload endpoint.
    pub const UPLOAD: Self = Self {
        allow_methods: "POST, OPTIONS",
    };

    /// Download endpoint.
    pub const DOWNLOAD: Self = Self {
        allow_methods: "GET, OPTIONS",
    };

    /// Value of `Access-Control-Allow-Methods`.
    #[must_use]
    pub const fn allow_methods(&self) -> &'static str {
        self.allow_methods
    }

    /// Wraps every route of `router` with this policy. `OPTIONS` requests
    /// are answered with `200` before reaching a handler.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(self.allow_methods),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ))
    }
}
