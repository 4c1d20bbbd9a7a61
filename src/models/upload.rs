//! Records kept in the `uploads` metadata table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One upload tracked by the gateway.
///
/// The same `filename` addresses the row here and the object in the backing
/// object store. The struct carries metadata only, never the content bytes.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct UploadRecord {
    /// Surrogate id generated by the metadata store, immutable once assigned.
    pub id: i64,

    /// Logical key shared between this row and the stored object.
    pub filename: String,

    /// Client-supplied original filename, when one was sent.
    pub original_filename: Option<String>,

    /// Client-declared content type, not validated against the bytes.
    pub mimetype: String,

    /// Byte length as reported by the transport layer.
    pub size: i64,
}

/// Insert payload for a new upload row. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub filename: String,
    pub original_filename: Option<String>,
    pub mimetype: String,
    pub size: i64,
}

/// Result metadata from the object-store side of an upload.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredObject {
    /// Key the object was stored under.
    pub key: String,

    /// Backend content hash, when the backend reports one.
    pub etag: Option<String>,

    /// Version identifier if the backend has versioning enabled.
    pub version_id: Option<String>,
}
