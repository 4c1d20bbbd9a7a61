use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub scratch_dir: String,
    pub database_url: String,
    /// Maximum accepted upload body size in bytes.
    pub max_upload_size: usize,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Disk,
    S3,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the disk backend.
    pub disk_dir: String,
    /// Bucket name (required when backend is s3).
    pub s3_bucket: Option<String>,
    /// Region override; the AWS default chain applies otherwise.
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible stores.
    pub s3_endpoint: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP file-upload gateway")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOAD_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploads are spooled before forwarding
    /// (overrides UPLOAD_GATEWAY_SCRATCH_DIR)
    #[arg(long)]
    pub scratch_dir: Option<String>,

    /// Database URL (overrides UPLOAD_GATEWAY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Apply the schema and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("UPLOAD_GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("UPLOAD_GATEWAY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing UPLOAD_GATEWAY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading UPLOAD_GATEWAY_PORT"),
        };
        let env_scratch =
            env::var("UPLOAD_GATEWAY_SCRATCH_DIR").unwrap_or_else(|_| "./data/uploads".into());
        let env_db = env::var("UPLOAD_GATEWAY_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/uploads.db".into());

        let max_upload_size = match env::var("MAX_UPLOAD_SIZE") {
            Ok(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing MAX_UPLOAD_SIZE value `{}`", value))?,
            Err(env::VarError::NotPresent) => 50 * 1024 * 1024,
            Err(err) => return Err(err).context("reading MAX_UPLOAD_SIZE"),
        };

        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "disk".into())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            _ => StorageBackend::Disk,
        };

        let storage = StorageConfig {
            backend,
            disk_dir: env::var("DISK_STORE_DIR").unwrap_or_else(|_| "./data/objects".into()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            scratch_dir: args.scratch_dir.unwrap_or(env_scratch),
            database_url: args.database_url.unwrap_or(env_db),
            max_upload_size,
            storage,
        };
        cfg.validate()?;

        Ok((cfg, args.migrate))
    }

    fn validate(&self) -> Result<()> {
        if matches!(self.storage.backend, StorageBackend::S3) && self.storage.s3_bucket.is_none() {
            anyhow::bail!("S3_BUCKET is required when STORAGE_BACKEND=s3");
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
