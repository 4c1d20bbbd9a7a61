//! upload-gateway - HTTP file-upload gateway.
//!
//! Receives a multipart file, records its metadata in a relational `uploads`
//! table (SQLite via sqlx) and forwards the bytes to an object-storage
//! backend (local disk or S3), then exposes list and delete on top. The
//! metadata table and the object store are independent services; the
//! `UploadCoordinator` owns the ordering between them.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

use std::path::PathBuf;

use services::metadata_store::MetadataStore;
use services::upload_coordinator::UploadCoordinator;

/// Shared state handed to every handler.
///
/// Both stores are constructed once at startup and injected here; nothing in
/// the request path reaches for ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadCoordinator,
    pub metadata: MetadataStore,
    /// Directory holding files between receipt and forwarding to the store.
    pub scratch_dir: PathBuf,
}
