mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::util::ServiceExt;
use upload_gateway::{
    AppState,
    routes::routes::routes,
    services::{object_store::DiskStore, upload_coordinator::UploadCoordinator},
};

const BOUNDARY: &str = "test-boundary-7d4a1c";

async fn test_app(dir: &tempfile::TempDir) -> Router {
    let metadata = common::test_metadata_store().await;
    let objects = Arc::new(DiskStore::new(dir.path().join("objects")).unwrap());

    let scratch_dir = dir.path().join("scratch");
    tokio::fs::create_dir_all(&scratch_dir).await.unwrap();

    let state = AppState {
        uploads: UploadCoordinator::new(metadata.clone(), objects),
        metadata,
        scratch_dir,
    };

    routes(1024 * 1024).with_state(state)
}

/// Hand-built multipart body: optional `fileName` text part plus one `file`
/// part carrying `bytes`.
fn multipart_body(
    file_name: Option<&str>,
    original: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(name) = file_name {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"fileName\"\r\n\r\n{name}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{original}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_list_delete_flow() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    // Upload with an explicit fileName override.
    let payload = b"fake png bytes";
    let body = multipart_body(Some("a.png"), "photo.png", "image/png", payload);
    let response = app.clone().oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["message"], "upload complete");
    assert_eq!(json["file"]["id"], 1);
    assert_eq!(json["file"]["filename"], "a.png");
    assert_eq!(json["file"]["original_filename"], "photo.png");
    assert_eq!(json["file"]["mimetype"], "image/png");
    assert_eq!(json["file"]["size"], payload.len() as i64);
    assert_eq!(json["s3Result"]["key"], "a.png");
    assert!(json["s3Result"]["etag"].is_string());

    // The object landed under the chosen key.
    assert!(dir.path().join("objects/a.png").exists());

    // List shows the upload.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/files")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(
        json,
        serde_json::json!([{ "filename": "a.png", "originalName": "photo.png" }])
    );

    // Delete removes row and object.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/files/a.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "file deleted");
    assert!(!dir.path().join("objects/a.png").exists());

    // List is empty again.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/files")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn upload_without_file_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    // Only a fileName part, no file.
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"fileName\"\r\n\r\na.png\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );

    let response = app.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "no file provided");
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn upload_without_file_name_derives_timestamp_key() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let body = multipart_body(None, "photo.png", "image/png", b"bytes");
    let response = app.clone().oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let key = json["file"]["filename"].as_str().unwrap().to_string();
    let (stem, ext) = key.rsplit_once('.').unwrap();
    assert_eq!(ext, "png");
    assert!(stem.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn delete_unknown_key_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/files/missing.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = json_body(response).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn healthz_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn readyz_reports_checks() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["database"]["ok"], true);
    assert_eq!(json["checks"]["scratch"]["ok"], true);
}
