//! SQLite-backed persistence for upload metadata.

use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::upload::{NewUpload, UploadRecord};

/// Schema for the `uploads` table. Create-if-absent, never destructive.
const SCHEMA_SQL: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// Relational store for `UploadRecord` rows.
///
/// Thin wrapper over a shared SQLite pool. Every operation is a single
/// statement, so no explicit transactions are involved; concurrency is
/// whatever the pool provides.
#[derive(Clone)]
pub struct MetadataStore {
    db: Arc<SqlitePool>,
}

impl MetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Create the `uploads` table if it does not exist.
    ///
    /// Safe to call repeatedly; invoked once at process startup and by the
    /// `--migrate` CLI mode.
    pub async fn ensure_schema(&self) -> MetadataResult<()> {
        let statements = SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty());

        for stmt in statements {
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Insert a row for `new`, overwriting any previous row stored under the
    /// same filename. Returns the stored record including its generated id;
    /// on overwrite the id of the existing row is kept.
    pub async fn insert(&self, new: &NewUpload) -> MetadataResult<UploadRecord> {
        let record = sqlx::query_as::<_, UploadRecord>(
            r#"
            INSERT INTO uploads (filename, original_filename, mimetype, size)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(filename) DO UPDATE SET
                original_filename = excluded.original_filename,
                mimetype = excluded.mimetype,
                size = excluded.size
            RETURNING id, filename, original_filename, mimetype, size
            "#,
        )
        .bind(&new.filename)
        .bind(&new.original_filename)
        .bind(&new.mimetype)
        .bind(new.size)
        .fetch_one(&*self.db)
        .await?;

        Ok(record)
    }

    /// Delete the row stored under `key`. Returns the number of rows removed.
    pub async fn delete_by_key(&self, key: &str) -> MetadataResult<u64> {
        let result = sqlx::query("DELETE FROM uploads WHERE filename = ?")
            .bind(key)
            .execute(&*self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Every row, in primary-key order.
    pub async fn select_all(&self) -> MetadataResult<Vec<UploadRecord>> {
        let rows = sqlx::query_as::<_, UploadRecord>(
            "SELECT id, filename, original_filename, mimetype, size
             FROM uploads ORDER BY id",
        )
        .fetch_all(&*self.db)
        .await?;

        Ok(rows)
    }

    /// Lightweight connectivity probe for readiness checks.
    pub async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }
}
