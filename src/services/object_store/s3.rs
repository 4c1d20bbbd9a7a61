use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use super::{ObjectStore, ObjectStoreError};
use crate::models::upload::StoredObject;

/// Amazon S3 (or S3-compatible) backend.
///
/// Credentials come from the standard AWS environment chain; the bucket is
/// fixed at construction.
pub struct S3Store {
    bucket: String,
    client: Client,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            client,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, source: &Path) -> Result<StoredObject, ObjectStoreError> {
        let body = ByteStream::from_path(source).await.map_err(|err| {
            ObjectStoreError::Backend(format!("reading {}: {err}", source.display()))
        })?;

        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| ObjectStoreError::Backend(format!("S3 put failed: {err}")))?;

        Ok(StoredObject {
            key: key.to_string(),
            etag: output.e_tag().map(|e| e.trim_matches('"').to_string()),
            version_id: output.version_id().map(str::to_string),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        // S3 DeleteObject succeeds for missing keys, which is exactly the
        // idempotence the coordinator expects.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| ObjectStoreError::Backend(format!("S3 delete failed: {err}")))?;

        Ok(())
    }
}
