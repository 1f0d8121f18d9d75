//! Router configuration for the drive API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    browse, create_folder, download_file, rename_item, storage_usage, toggle_star, toggle_trash,
    upload_file, AppState,
};
use super::middleware::create_cors_layer;
use crate::config::WebConfig;

/// Create the main API router.
///
/// Uploads are capped at `web.max_upload_size_mb` (0 = unlimited).
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    let upload_limit = if config.max_upload_size_mb == 0 {
        DefaultBodyLimit::disable()
    } else {
        let bytes = config.max_upload_size_mb.saturating_mul(1024 * 1024);
        DefaultBodyLimit::max(usize::try_from(bytes).unwrap_or(usize::MAX))
    };

    let api_routes = Router::new()
        .route("/browse", get(browse))
        .route("/upload", post(upload_file).layer(upload_limit))
        .route("/folder", post(create_folder))
        .route("/rename/:kind/:id", put(rename_item))
        .route("/star/:kind/:id", post(toggle_star))
        .route("/trash/:kind/:id", delete(toggle_trash))
        .route("/file/:id/content", get(download_file))
        .route("/storage", get(storage_usage));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.cors_origins)),
        )
        .with_state(app_state)
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
