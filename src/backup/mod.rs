//! Incremental backup engine.

use crate::error::AppError;
use crate::store::RemoteStore;
use chrono::{DateTime, Utc};
use std::path::Path;

#[derive(Debug)]
pub enum FileOutcome {
    Uploaded,
    Unchanged,
    Failed(AppError),
}

/// Outcome of one file in a backup batch.
#[derive(Debug)]
pub struct FileReport {
    pub name: String,
    pub outcome: FileOutcome,
}

/// Upload when the remote copy is missing or strictly older. An identical
/// timestamp means the remote copy is up to date. Local mtimes and store
/// timestamps come from different clocks; skew is a known limitation, not
/// something this comparison tries to correct.
pub fn should_upload(local: DateTime<Utc>, remote: Option<DateTime<Utc>>) -> bool {
    match remote {
        None => true,
        Some(remote) => local > remote,
    }
}

/// Per-file decision against the live store. Remote state is re-queried on
/// every call; nothing is cached between decisions. Head failures other
/// than not-found propagate untouched.
pub async fn evaluate<S: RemoteStore + ?Sized>(
    store: &S,
    bucket: &str,
    key: &str,
    local_modified: Option<DateTime<Utc>>,
) -> Result<bool, AppError> {
    let Some(local) = local_modified else {
        // Filesystem could not report an mtime; upload unconditionally.
        return Ok(true);
    };

    let remote = store.head_modified(bucket, key).await?;
    Ok(should_upload(local, remote))
}

/// Back up every regular file in `folder` (one level, no recursion) to
/// `bucket`, keyed by file name. Each file is decided and transferred
/// independently; one file's failure is recorded and the batch continues.
/// Only an unreadable directory aborts the whole operation.
pub async fn backup_folder<S: RemoteStore + ?Sized>(
    store: &S,
    bucket: &str,
    folder: &Path,
) -> Result<Vec<FileReport>, AppError> {
    let entries = std::fs::read_dir(folder)
        .map_err(|e| AppError::LocalIo(format!("Read dir {:?}: {}", folder, e)))?;

    let mut reports = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                reports.push(FileReport {
                    name: "<unreadable entry>".to_string(),
                    outcome: FileOutcome::Failed(e.into()),
                });
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                reports.push(FileReport {
                    name,
                    outcome: FileOutcome::Failed(e.into()),
                });
                continue;
            }
        };

        // Flat scan: subdirectories and other non-regular entries are
        // skipped, not recursed into.
        if !metadata.is_file() {
            continue;
        }

        let local_modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        let outcome = match evaluate(store, bucket, &name, local_modified).await {
            Ok(true) => match store.put_file(bucket, &name, &entry.path()).await {
                Ok(()) => {
                    log::info!("Uploaded {} to {}", name, bucket);
                    FileOutcome::Uploaded
                }
                Err(e) => FileOutcome::Failed(e),
            },
            Ok(false) => {
                log::info!("No changes to {}, not uploading", name);
                FileOutcome::Unchanged
            }
            Err(e) => FileOutcome::Failed(e),
        };

        reports.push(FileReport { name, outcome });
    }

    Ok(reports)
}
