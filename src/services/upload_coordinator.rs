//! Sequencing of the metadata write and the object transfer.
//!
//! The metadata table and the object store are independent services with no
//! transaction spanning them. This module owns the ordering between the two
//! and the handling of partial failure; the policy for each failure point is
//! documented on the operations below.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::fs;
use tracing::{error, warn};

use super::metadata_store::{MetadataError, MetadataStore};
use super::object_store::{ObjectStore, ObjectStoreError};
use crate::models::upload::{NewUpload, StoredObject, UploadRecord};

const MAX_KEY_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload key")]
    InvalidKey,
    #[error("no upload found for `{0}`")]
    NotFound(String),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Orchestrates an upload across the metadata table and the object store.
///
/// Holds no state beyond the two injected stores, so cloning is cheap and no
/// locking is involved. Access to a given key is not serialized: two
/// concurrent uploads using the same key race, and the last writer to each
/// store wins independently.
#[derive(Clone)]
pub struct UploadCoordinator {
    metadata: MetadataStore,
    objects: Arc<dyn ObjectStore>,
}

impl UploadCoordinator {
    pub fn new(metadata: MetadataStore, objects: Arc<dyn ObjectStore>) -> Self {
        Self { metadata, objects }
    }

    /// Reject keys that are empty or could escape the store's namespace.
    fn ensure_key_safe(key: &str) -> UploadResult<()> {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(UploadError::InvalidKey);
        }
        if key.starts_with('/') || key.contains("..") {
            return Err(UploadError::InvalidKey);
        }
        if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
            return Err(UploadError::InvalidKey);
        }
        Ok(())
    }

    /// Record and store a fully-received local file.
    ///
    /// The metadata row is inserted first, then the bytes are transferred. A
    /// transfer failure after the insert leaves a row with no backing object;
    /// that row is kept (logged and surfaced) rather than rolled back. A
    /// failure removing the scratch file is non-fatal: both stores already
    /// hold correct state and the leftover file is cleanup debt.
    pub async fn upload(
        &self,
        local_path: &Path,
        key: &str,
        original_name: Option<&str>,
        mimetype: &str,
        size: i64,
    ) -> UploadResult<(UploadRecord, StoredObject)> {
        Self::ensure_key_safe(key)?;

        let record = self
            .metadata
            .insert(&NewUpload {
                filename: key.to_string(),
                original_filename: original_name.map(str::to_string),
                mimetype: mimetype.to_string(),
                size,
            })
            .await?;

        let stored = match self.objects.put(key, local_path).await {
            Ok(stored) => stored,
            Err(err) => {
                error!(
                    key,
                    id = record.id,
                    error = %err,
                    "object upload failed after metadata insert; row has no backing object"
                );
                return Err(err.into());
            }
        };

        if let Err(err) = fs::remove_file(local_path).await {
            warn!(
                path = %local_path.display(),
                error = %err,
                "failed to remove scratch file after upload"
            );
        }

        Ok((record, stored))
    }

    /// Remove the row and the object stored under `key`.
    ///
    /// When no row matches, the object store is not touched. When the object
    /// delete fails after the row is gone, the stored object is orphaned (a
    /// storage leak, not a read hazard); the error is still surfaced.
    pub async fn delete(&self, key: &str) -> UploadResult<()> {
        let rows = self.metadata.delete_by_key(key).await?;
        if rows == 0 {
            return Err(UploadError::NotFound(key.to_string()));
        }

        if let Err(err) = self.objects.delete(key).await {
            error!(
                key,
                error = %err,
                "object delete failed after metadata row removal; object is orphaned"
            );
            return Err(err.into());
        }

        Ok(())
    }

    /// Every tracked upload, in insertion (primary-key) order. No pagination.
    pub async fn list(&self) -> UploadResult<Vec<UploadRecord>> {
        Ok(self.metadata.select_all().await?)
    }
}
