//! Defines the gateway's HTTP routes.
//!
//! ## Structure
//! - `POST   /upload`           — multipart upload (one `file` field + optional `fileName`)
//! - `GET    /files`            — list every tracked upload
//! - `DELETE /files/{filename}` — remove one upload (row + stored object)
//! - `GET    /healthz`, `GET /readyz` — liveness and readiness
//!
//! CORS is wide open (any origin, method, header), matching how the gateway
//! is consumed by browser clients on other origins.

use crate::{
    AppState,
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{delete_file, list_files, upload},
    },
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build and return the router for all gateway routes.
///
/// The router carries shared state (`AppState`) to all handlers; the upload
/// route is capped at `max_upload_size` bytes.
pub fn routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // upload + file management
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/files", get(list_files))
        .route("/files/{filename}", delete(delete_file))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
