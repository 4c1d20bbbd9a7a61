use anyhow::Result;
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use upload_gateway::{
    AppState,
    config::{AppConfig, StorageBackend},
    routes,
    services::{
        metadata_store::MetadataStore,
        object_store::{DiskStore, ObjectStore, S3Store},
        upload_coordinator::UploadCoordinator,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting upload-gateway with config: {:?}", cfg);

    // --- Ensure scratch directory exists ---
    if !Path::new(&cfg.scratch_dir).exists() {
        fs::create_dir_all(&cfg.scratch_dir)?;
        tracing::info!("Created scratch directory at {}", cfg.scratch_dir);
    }

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");

    // Create parent directory if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    // SQLx does not create the database file on a plain connect
    if let Err(err) = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(db_path)
    {
        tracing::warn!("Failed to open database file {}: {}", db_path, err);
    }

    let db: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?,
    );

    let metadata = MetadataStore::new(db);
    metadata.ensure_schema().await?;

    // --- Handle migration mode ---
    if migrate {
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Initialize object store backend ---
    let objects: Arc<dyn ObjectStore> = match cfg.storage.backend {
        StorageBackend::Disk => {
            let store = DiskStore::new(&cfg.storage.disk_dir)?;
            tracing::info!("Using disk storage backend at {}", cfg.storage.disk_dir);
            Arc::new(store)
        }
        StorageBackend::S3 => {
            let bucket = cfg
                .storage
                .s3_bucket
                .clone()
                .expect("S3_BUCKET validated in config");
            let client = s3_client(&cfg).await;
            tracing::info!("Using S3 storage backend, bucket: {}", bucket);
            Arc::new(S3Store::new(client, bucket))
        }
    };

    // --- Initialize core service ---
    let state = AppState {
        uploads: UploadCoordinator::new(metadata.clone(), objects),
        metadata,
        scratch_dir: cfg.scratch_dir.clone().into(),
    };

    // --- Build router ---
    let app: Router = routes::routes::routes(cfg.max_upload_size).with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the S3 client from the standard AWS environment chain, with
/// optional region and endpoint overrides from the gateway config.
async fn s3_client(cfg: &AppConfig) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = cfg.storage.s3_region.clone() {
        loader = loader.region(aws_config::Region::new(region));
    }
    let base = loader.load().await;

    let mut builder = aws_sdk_s3::config::Builder::from(&base);
    if let Some(endpoint) = cfg.storage.s3_endpoint.clone() {
        // S3-compatible stores generally want path-style addressing.
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}
