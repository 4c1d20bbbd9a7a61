//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use upload_gateway::services::metadata_store::MetadataStore;

/// In-memory metadata store with the schema applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn test_metadata_store() -> MetadataStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    let store = MetadataStore::new(Arc::new(pool));
    store.ensure_schema().await.expect("failed to apply schema");
    store
}

/// Write a fully-received scratch file the coordinator can consume.
pub async fn write_scratch(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    tokio::fs::write(&path, contents)
        .await
        .expect("failed to write scratch file");
    path
}
