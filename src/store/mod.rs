//! Object store boundary.

pub mod s3;

pub use s3::S3Store;

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

/// One historical revision of an object.
#[derive(Debug, Clone)]
pub struct ObjectVersion {
    pub version_id: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// The capability set the backup engine consumes. Kept minimal so tests
/// can run the engine against an in-memory fake.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Last-modified instant of (bucket, key), or `None` when the object
    /// does not exist. Any other failure is a `Storage` error; callers
    /// must not collapse it into either answer.
    async fn head_modified(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<DateTime<Utc>>, AppError>;

    /// Upload a local file as (bucket, key).
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), AppError>;
}

/// Non-empty prefixes get a trailing separator so "logs" and "logs/" list
/// the same keys. An empty prefix selects the whole bucket.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}
