//! HTTP Routes
//!
//! - `POST /upload-file` - multipart upload forwarded to S3
//! - `GET /download-file/{key}` - fetch an object by key
//! - `DELETE /files/{key}` - delete an object by key
//! - `GET /health` - health check

pub mod files;
pub mod health;

use axum::Router;
use crate::models::AppState;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    Router::new()
        .merge(files::router(state.clone()))
        .merge(health::router(state))
        .layer(TraceLayer::new_for_http())
}
