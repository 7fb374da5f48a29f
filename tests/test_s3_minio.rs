//! Optional MinIO integration tests for the S3 store.
//! Run only when BUCKUP_MINIO_TEST=1 is set.

use buckup::backup::evaluate;
use buckup::store::S3Store;
use chrono::{DateTime, Utc};
use std::env;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct MinioTestConfig {
    endpoint: String,
    bucket: String,
    access_key: String,
    secret_key: String,
    object_prefix: String,
}

impl MinioTestConfig {
    fn from_env() -> Option<Self> {
        if env::var("BUCKUP_MINIO_TEST").ok().as_deref() != Some("1") {
            return None;
        }

        Some(Self {
            endpoint: required("BUCKUP_TEST_S3_ENDPOINT"),
            bucket: required("BUCKUP_TEST_S3_BUCKET"),
            access_key: required("BUCKUP_TEST_S3_ACCESS_KEY"),
            secret_key: required("BUCKUP_TEST_S3_SECRET_KEY"),
            object_prefix: env::var("BUCKUP_TEST_OBJECT_PREFIX")
                .unwrap_or_else(|_| "tests/minio".to_string()),
        })
    }
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("Missing env var: {}", name))
}

fn make_store(cfg: &MinioTestConfig) -> S3Store {
    let rt = tokio::runtime::Runtime::new().expect("create tokio runtime");
    rt.block_on(async {
        S3Store::new_with_endpoint(
            cfg.endpoint.clone(),
            None,
            cfg.access_key.clone(),
            cfg.secret_key.clone(),
        )
        .await
        .expect("create S3 store with custom endpoint")
    })
}

fn run_id() -> String {
    Uuid::new_v4()
        .to_string()
        .replace('-', "")
        .chars()
        .take(8)
        .collect()
}

#[test]
fn minio_smoke_full_object_lifecycle() {
    let Some(cfg) = MinioTestConfig::from_env() else {
        eprintln!("skip minio_smoke_full_object_lifecycle: BUCKUP_MINIO_TEST != 1");
        return;
    };

    let store = make_store(&cfg);
    let dir = tempfile::tempdir().expect("create temp dir");
    let local_path = dir.path().join("hello.txt");
    std::fs::write(&local_path, b"buckup-minio-smoke").expect("write local file");
    let key = format!("{}/smoke-{}/hello.txt", cfg.object_prefix, run_id());

    let rt = tokio::runtime::Runtime::new().expect("create tokio runtime");
    rt.block_on(async {
        let buckets = store.list_buckets().await.expect("list buckets");
        assert!(
            buckets.iter().any(|b| b == &cfg.bucket),
            "bucket list should contain the test bucket"
        );

        store
            .put_file(&cfg.bucket, &key, &local_path)
            .await
            .expect("upload smoke object");

        let modified = store
            .head_modified(&cfg.bucket, &key)
            .await
            .expect("head smoke object");
        assert!(modified.is_some(), "uploaded object should exist");

        // Remote was just stamped by the store's clock, so rerunning the
        // decision for the unchanged local file must skip.
        let mtime = std::fs::metadata(&local_path)
            .expect("stat local file")
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);
        let decision = evaluate(&store, &cfg.bucket, &key, mtime)
            .await
            .expect("evaluate unchanged file");
        assert!(!decision, "unchanged file should not re-upload");

        // "logs" and "logs/" must list the same keys.
        let parent = key.rsplit_once('/').unwrap().0;
        let with_slash = store
            .list_objects(&cfg.bucket, &format!("{}/", parent))
            .await
            .expect("list with trailing slash");
        let without_slash = store
            .list_objects(&cfg.bucket, parent)
            .await
            .expect("list without trailing slash");
        assert_eq!(with_slash, without_slash);
        assert!(with_slash.iter().any(|k| k == &key));

        let url = store
            .presign_get(&cfg.bucket, &key, Duration::from_secs(120))
            .await
            .expect("presign smoke object");
        assert!(url.contains("hello.txt"), "presigned URL should reference the key");

        let dest = dir.path().join("downloaded.txt");
        store
            .download_object(&cfg.bucket, &key, &dest)
            .await
            .expect("download smoke object");
        let downloaded = std::fs::read(&dest).expect("read downloaded file");
        assert_eq!(downloaded, b"buckup-minio-smoke");

        let versions = store
            .list_versions(&cfg.bucket, &key)
            .await
            .expect("list versions of smoke object");
        assert!(
            !versions.is_empty(),
            "existing object should have at least one version entry"
        );

        store
            .delete_object(&cfg.bucket, &key)
            .await
            .expect("delete smoke object");
        let after_delete = store
            .head_modified(&cfg.bucket, &key)
            .await
            .expect("head after delete");
        assert!(after_delete.is_none(), "deleted object should be gone");
    });
}

#[test]
fn minio_list_pagination_returns_all_objects() {
    let Some(cfg) = MinioTestConfig::from_env() else {
        eprintln!("skip minio_list_pagination_returns_all_objects: BUCKUP_MINIO_TEST != 1");
        return;
    };

    let store = make_store(&cfg);
    let prefix = format!("{}/pagination-{}/", cfg.object_prefix, run_id());
    let dir = tempfile::tempdir().expect("create temp dir");
    let local_path = dir.path().join("x.txt");
    std::fs::write(&local_path, b"x").expect("write local file");

    // >1000 is important to verify list_objects_v2 pagination.
    let object_count = 1005usize;
    let keys: Vec<String> = (0..object_count)
        .map(|i| format!("{}obj-{:04}.txt", prefix, i))
        .collect();

    let rt = tokio::runtime::Runtime::new().expect("create tokio runtime");
    rt.block_on(async {
        for key in &keys {
            store
                .put_file(&cfg.bucket, key, &local_path)
                .await
                .expect("upload pagination object");
        }

        let listed = store
            .list_objects(&cfg.bucket, &prefix)
            .await
            .expect("list paginated keys");
        assert_eq!(
            listed.len(),
            object_count,
            "list_objects should return all keys across pages"
        );
        for key in &keys {
            assert!(
                listed.iter().any(|v| v == key),
                "missing key from paginated list: {}",
                key
            );
        }

        // Best-effort cleanup.
        for key in &keys {
            let _ = store.delete_object(&cfg.bucket, key).await;
        }
    });
}
