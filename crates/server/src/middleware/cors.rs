//! CORS policy.

use axum::http::{
    HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use url::Url;

/// Build the CORS layer for the configured browser origins.
///
/// Only the listed origins get CORS headers. Requests without an `Origin`
/// header are passed through unchanged.
#[must_use]
pub fn cors_layer(allowed_origins: &[Url]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|url| HeaderValue::from_str(&origin_of(url)).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

/// `Url` serializes a bare origin with a trailing slash; browsers send none.
fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}
