//! CORS configuration for the drive API.

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Methods used by the drive routes.
const DRIVE_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Create a CORS layer from the configured origins.
///
/// With no usable origin, any origin is allowed without credentials.
/// Download headers are exposed so browser clients can read the filename.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(DRIVE_METHODS)
        .expose_headers([CONTENT_DISPOSITION, CONTENT_LENGTH]);

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    if allowed.is_empty() {
        if !origins.is_empty() {
            tracing::warn!("No valid CORS origin in {:?}; allowing any origin", origins);
        }
        return base.allow_headers(Any).allow_origin(Any);
    }

    base.allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        .allow_credentials(true)
        .allow_origin(allowed)
}
