//! HTTP handlers for the upload, list and delete routes.
//!
//! The multipart body streams to a scratch file first; the coordinator only
//! ever sees fully-received local files.

use std::ffi::OsStr;
use std::path::PathBuf;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::Field},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::AppState;
use crate::errors::AppError;
use crate::models::upload::{StoredObject, UploadRecord};

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file: UploadRecord,
    #[serde(rename = "s3Result")]
    pub s3_result: StoredObject,
}

#[derive(Serialize)]
pub struct ListEntry {
    pub filename: String,
    #[serde(rename = "originalName", skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

/// One multipart `file` part, spooled to the scratch directory.
struct ReceivedFile {
    path: PathBuf,
    original_name: Option<String>,
    content_type: Option<String>,
    size: i64,
}

/// `POST /upload` — multipart form with one `file` field and an optional
/// `fileName` field overriding the derived key.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut received: Option<ReceivedFile> = None;
    let mut file_name_field: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart data: {err}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let original_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let (path, size) = spool_to_scratch(&state.scratch_dir, &mut field).await?;

                received = Some(ReceivedFile {
                    path,
                    original_name,
                    content_type,
                    size,
                });
            }
            "fileName" => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(format!("invalid fileName: {err}")))?;
                if !text.trim().is_empty() {
                    file_name_field = Some(text);
                }
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let Some(file) = received else {
        return Err(AppError::bad_request("no file provided"));
    };

    let key = derive_key(
        file_name_field.as_deref(),
        file.original_name.as_deref(),
        Utc::now(),
    );
    let mimetype = resolve_mimetype(file.content_type.as_deref(), file.original_name.as_deref());

    let (record, stored) = state
        .uploads
        .upload(
            &file.path,
            &key,
            file.original_name.as_deref(),
            &mimetype,
            file.size,
        )
        .await?;

    tracing::debug!(key = %record.filename, id = record.id, "stored upload");

    Ok(Json(UploadResponse {
        message: "upload complete".to_string(),
        file: record,
        s3_result: stored,
    }))
}

/// `GET /files` — every tracked upload, no pagination.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<ListEntry>>, AppError> {
    let records = state.uploads.list().await?;

    let entries = records
        .into_iter()
        .map(|record| ListEntry {
            filename: record.filename,
            original_name: record.original_filename,
        })
        .collect();

    Ok(Json(entries))
}

/// `DELETE /files/{filename}` — remove the row and the stored object.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.uploads.delete(&filename).await?;

    Ok(Json(json!({ "message": "file deleted" })))
}

/// Stream a multipart field into a uniquely-named scratch file.
///
/// Returns the path and the number of bytes written. The partial file is
/// removed on any read or write error.
async fn spool_to_scratch(
    scratch_dir: &std::path::Path,
    field: &mut Field<'_>,
) -> Result<(PathBuf, i64), AppError> {
    let path = scratch_dir.join(format!(".upload-{}", Uuid::new_v4()));
    let mut file = fs::File::create(&path)
        .await
        .map_err(|err| AppError::internal(format!("creating scratch file: {err}")))?;

    let mut size: i64 = 0;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(err) => {
                let _ = fs::remove_file(&path).await;
                return Err(AppError::bad_request(format!("failed to read file: {err}")));
            }
        };
        size += chunk.len() as i64;
        if let Err(err) = file.write_all(&chunk).await {
            let _ = fs::remove_file(&path).await;
            return Err(AppError::internal(format!("writing scratch file: {err}")));
        }
    }
    if let Err(err) = file.flush().await {
        let _ = fs::remove_file(&path).await;
        return Err(AppError::internal(format!("flushing scratch file: {err}")));
    }

    Ok((path, size))
}

/// Choose the key an upload is stored under.
///
/// An explicit `fileName` field wins. Otherwise a millisecond timestamp plus
/// the original filename's extension, so keys stay unique in practice.
fn derive_key(
    client_name: Option<&str>,
    original_name: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    if let Some(name) = client_name {
        return name.trim().to_string();
    }

    let millis = now.timestamp_millis();
    match original_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(OsStr::to_str)
    {
        Some(ext) => format!("{millis}.{ext}"),
        None => millis.to_string(),
    }
}

/// Content type from the multipart part when meaningful, else guessed from
/// the original filename, else the octet-stream fallback.
fn resolve_mimetype(content_type: Option<&str>, original_name: Option<&str>) -> String {
    content_type
        .filter(|ct| *ct != "application/octet-stream")
        .map(str::to_string)
        .or_else(|| {
            original_name
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|mime| mime.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
