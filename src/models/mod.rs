//! Core data models for the upload gateway.
//!
//! These entities map 1:1 to the `uploads` metadata table via
//! `sqlx::FromRow` and serialize naturally as JSON via `serde`.

pub mod upload;
