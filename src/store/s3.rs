//! aws-sdk-s3 wrapper behind the store boundary.

use crate::error::AppError;
use crate::store::{normalize_prefix, ObjectVersion, RemoteStore};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::{Duration, Instant};

pub const DEFAULT_PRESIGN_TTL_SECS: u64 = 3600;

pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Create client with AWS credentials from the default provider chain.
    pub async fn new(region: Option<String>) -> Result<Self, AppError> {
        let region_provider = match region {
            Some(r) => RegionProviderChain::first_try(Region::new(r)).or_else("us-east-1"),
            None => RegionProviderChain::default_provider().or_else("us-east-1"),
        };
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        Ok(Self {
            client: Client::new(&config),
        })
    }

    /// Create client with custom endpoint (for MinIO, R2, OSS, etc.)
    pub async fn new_with_endpoint(
        endpoint: String,
        region: Option<String>,
        access_key: String,
        secret_key: String,
    ) -> Result<Self, AppError> {
        use aws_credential_types::Credentials;

        let creds = Credentials::new(access_key, secret_key, None, None, "custom");

        let region_provider = match region.or_else(|| infer_region_from_endpoint(&endpoint)) {
            Some(r) => RegionProviderChain::first_try(Region::new(r)).or_else("us-east-1"),
            None => RegionProviderChain::default_provider().or_else("us-east-1"),
        };

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region_provider)
            .endpoint_url(endpoint)
            .credentials_provider(creds)
            .load()
            .await;

        // Use virtual-hosted style for S3-compatible endpoints.
        // For Aliyun OSS, this is required (SecondLevelDomainForbidden).
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(false)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }

    /// List all bucket names in the account.
    pub async fn list_buckets(&self) -> Result<Vec<String>, AppError> {
        let resp = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("list buckets: {}", DisplayErrorContext(&e))))?;

        Ok(resp
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(String::from))
            .collect())
    }

    /// Last-modified instant of (bucket, key), `None` when the object does
    /// not exist. Transport/auth/throttle failures are `Storage` errors so
    /// the upload decision can tell them apart from a missing object.
    pub async fn head_modified(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => Ok(resp.last_modified().and_then(to_chrono)),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "head {}/{}: {}",
                bucket,
                key,
                DisplayErrorContext(&e)
            ))),
        }
    }

    /// Upload a local file as (bucket, key).
    pub async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), AppError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| AppError::LocalIo(format!("Read {:?}: {}", path, e)))?;

        let start = Instant::now();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "put {}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        log::info!("S3 upload: {}/{} ({:.2?})", bucket, key, start.elapsed());
        Ok(())
    }

    /// List object keys under a prefix. A non-empty prefix is normalized to
    /// end with `/`; pagination is followed so buckets with more than one
    /// page of keys are fully listed.
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, AppError> {
        let prefix = normalize_prefix(prefix);
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self.client.list_objects_v2().bucket(bucket);
            if !prefix.is_empty() {
                req = req.prefix(&prefix);
            }
            if let Some(token) = &continuation_token {
                req = req.continuation_token(token);
            }

            let resp = req.send().await.map_err(|e| {
                AppError::Storage(format!("list {}: {}", bucket, DisplayErrorContext(&e)))
            })?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(String::from)),
            );

            if resp.is_truncated() == Some(true) {
                continuation_token = resp.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(keys)
    }

    /// Download (bucket, key) into a local file.
    pub async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<(), AppError> {
        let start = Instant::now();
        let resp = match self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Err(AppError::NotFound(format!("{}/{}", bucket, key)));
            }
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "get {}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                )));
            }
        };

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("read body of {}/{}: {}", bucket, key, e)))?
            .into_bytes();

        tokio::fs::write(dest, &data)
            .await
            .map_err(|e| AppError::LocalIo(format!("Write {:?}: {}", dest, e)))?;

        log::info!(
            "S3 download: {}/{} ({:.2?}, {} bytes)",
            bucket,
            key,
            start.elapsed(),
            data.len()
        );
        Ok(())
    }

    /// Presigned GET URL valid for `ttl`.
    pub async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let presign_config = PresigningConfig::expires_in(ttl)
            .map_err(|e| AppError::Validation(format!("Invalid expiry: {}", e)))?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "presign {}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(presigned.uri().to_string())
    }

    /// All versions of `key`, walking key/version-id marker pages across
    /// the bucket's version list.
    pub async fn list_versions(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<ObjectVersion>, AppError> {
        let mut versions = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            let mut req = self.client.list_object_versions().bucket(bucket);
            if let Some(k) = &key_marker {
                req = req.key_marker(k);
            }
            if let Some(v) = &version_id_marker {
                req = req.version_id_marker(v);
            }

            let resp = req.send().await.map_err(|e| {
                AppError::Storage(format!(
                    "list versions of {}: {}",
                    bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

            versions.extend(versions_matching_key(resp.versions(), key));

            if resp.is_truncated() == Some(true) {
                key_marker = resp.next_key_marker().map(String::from);
                version_id_marker = resp.next_version_id_marker().map(String::from);
            } else {
                break;
            }
        }

        Ok(versions)
    }

    /// Delete (bucket, key). Deleting a missing key succeeds, per S3.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "delete {}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        log::info!("S3 deleted: {}/{}", bucket, key);
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for S3Store {
    async fn head_modified(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        S3Store::head_modified(self, bucket, key).await
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), AppError> {
        S3Store::put_file(self, bucket, key, path).await
    }
}

/// Exact-key filter over one page of a bucket's version list.
pub fn versions_matching_key(
    page: &[aws_sdk_s3::types::ObjectVersion],
    key: &str,
) -> Vec<ObjectVersion> {
    page.iter()
        .filter(|v| v.key() == Some(key))
        .map(|v| ObjectVersion {
            version_id: v.version_id().unwrap_or_default().to_string(),
            last_modified: v.last_modified().and_then(to_chrono),
        })
        .collect()
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn infer_region_from_endpoint(endpoint: &str) -> Option<String> {
    // Heuristics for common S3-compatible endpoints.
    // - Aliyun OSS: "oss-cn-shanghai.aliyuncs.com" -> "oss-cn-shanghai"
    // - Cloudflare R2: region is typically "auto"
    let host = endpoint
        .split("://")
        .nth(1)
        .unwrap_or(endpoint)
        .split('/')
        .next()
        .unwrap_or("");

    if host.contains("r2.cloudflarestorage.com") {
        return Some("auto".to_string());
    }

    for label in host.split('.') {
        if label.starts_with("oss-") {
            return Some(label.to_string());
        }
    }

    None
}
