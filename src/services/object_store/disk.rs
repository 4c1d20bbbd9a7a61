use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::{ObjectStore, ObjectStoreError};
use crate::models::upload::StoredObject;

/// Local filesystem backend for development and tests.
pub struct DiskStore {
    base_path: PathBuf,
}

impl DiskStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl ObjectStore for DiskStore {
    async fn put(&self, key: &str, source: &Path) -> Result<StoredObject, ObjectStoreError> {
        let data = fs::read(source).await?;
        let etag = format!("{:x}", md5::compute(&data));

        let final_path = self.object_path(key);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write through a temp file so a concurrent reader never observes a
        // half-written object.
        let tmp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));
        if let Err(err) = fs::write(&tmp_path, &data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        Ok(StoredObject {
            key: key.to_string(),
            etag: Some(etag),
            version_id: None,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        match fs::remove_file(self.object_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
