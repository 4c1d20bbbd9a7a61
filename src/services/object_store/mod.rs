//! Abstraction over the backing object storage.

mod disk;
mod s3;

pub use disk::DiskStore;
pub use s3::S3Store;

use std::io;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::upload::StoredObject;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Object-storage backend keyed by the upload filename.
///
/// `put` uploads the full contents of an already-received local file and
/// overwrites unconditionally; there are no if-not-exists semantics.
/// `delete` treats a missing key as already gone.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, source: &Path) -> Result<StoredObject, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}
