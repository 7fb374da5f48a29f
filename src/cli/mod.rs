//! Argument surface and interactive menu.

use crate::backup::{self, FileOutcome};
use crate::config::Profile;
use crate::error::AppError;
use crate::store::s3::DEFAULT_PRESIGN_TTL_SECS;
use crate::store::S3Store;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Custom S3-compatible endpoint (MinIO, R2, OSS). Requires static
    /// credentials.
    #[arg(long, env = "BUCKUP_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region override; inferred from the endpoint or taken from the AWS
    /// default chain when omitted
    #[arg(long, env = "BUCKUP_REGION")]
    pub region: Option<String>,

    /// Access key for a custom endpoint
    #[arg(long, env = "BUCKUP_ACCESS_KEY")]
    pub access_key: Option<String>,

    /// Secret key for a custom endpoint
    #[arg(long, env = "BUCKUP_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Profile file with connection defaults
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

/// The eight menu actions, dispatched by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ListBuckets,
    BackupFolder,
    ListContents,
    DownloadObject,
    PresignUrl,
    ListVersions,
    DeleteObject,
    Exit,
}

impl MenuAction {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::ListBuckets),
            "2" => Some(Self::BackupFolder),
            "3" => Some(Self::ListContents),
            "4" => Some(Self::DownloadObject),
            "5" => Some(Self::PresignUrl),
            "6" => Some(Self::ListVersions),
            "7" => Some(Self::DeleteObject),
            "8" => Some(Self::Exit),
            _ => None,
        }
    }
}

const MENU: &str = "\nMain Menu:
1. List all buckets
2. Backup files to S3
3. List bucket objects
4. Download an object
5. Generate a pre-signed URL
6. List version information for an object
7. Delete an object from a bucket
8. Exit";

/// Interactive loop. One action's failure is reported and the loop
/// continues; only menu exit (or a closed stdin) ends it.
pub async fn run_menu(store: &S3Store, profile: &Profile) -> Result<(), AppError> {
    loop {
        println!("{}", MENU);
        let choice = prompt("Enter your choice")?;

        let Some(action) = MenuAction::parse(&choice) else {
            println!("Invalid choice. Please try again!");
            continue;
        };

        if action == MenuAction::Exit {
            return Ok(());
        }

        if let Err(e) = run_action(store, profile, action).await {
            println!("Error [{}]: {}", e.code(), e);
        }
    }
}

async fn run_action(
    store: &S3Store,
    profile: &Profile,
    action: MenuAction,
) -> Result<(), AppError> {
    match action {
        MenuAction::ListBuckets => list_buckets(store).await,
        MenuAction::BackupFolder => backup_folder(store, profile).await,
        MenuAction::ListContents => list_contents(store, profile).await,
        MenuAction::DownloadObject => download_object(store, profile).await,
        MenuAction::PresignUrl => presign_url(store, profile).await,
        MenuAction::ListVersions => list_versions(store, profile).await,
        MenuAction::DeleteObject => delete_object(store, profile).await,
        MenuAction::Exit => Ok(()),
    }
}

async fn list_buckets(store: &S3Store) -> Result<(), AppError> {
    for name in store.list_buckets().await? {
        println!("{}", name);
    }
    Ok(())
}

async fn backup_folder(store: &S3Store, profile: &Profile) -> Result<(), AppError> {
    let folder = prompt("Enter the path of the local folder")?;
    let bucket = prompt_bucket(profile)?;

    let reports = backup::backup_folder(store, &bucket, Path::new(&folder)).await?;
    for report in &reports {
        match &report.outcome {
            FileOutcome::Uploaded => println!("Uploaded {} to {}", report.name, bucket),
            FileOutcome::Unchanged => {
                println!("No changes were made to {}, not uploading.", report.name)
            }
            FileOutcome::Failed(e) => {
                println!("Failed {}: [{}] {}", report.name, e.code(), e)
            }
        }
    }
    Ok(())
}

async fn list_contents(store: &S3Store, profile: &Profile) -> Result<(), AppError> {
    let bucket = prompt_bucket(profile)?;
    let prefix = prompt("Enter the server folder name")?;

    for key in store.list_objects(&bucket, &prefix).await? {
        println!("{}", key);
    }
    Ok(())
}

async fn download_object(store: &S3Store, profile: &Profile) -> Result<(), AppError> {
    let bucket = prompt_bucket(profile)?;
    let folder = prompt("Enter the server folder name")?;
    let name = prompt("Enter the object name")?;
    if name.is_empty() {
        return Err(AppError::Validation("object name is required".to_string()));
    }

    let key = if folder.is_empty() {
        name.clone()
    } else {
        format!("{}/{}", folder.trim_end_matches('/'), name)
    };

    // Written to the object name in the current directory.
    store.download_object(&bucket, &key, Path::new(&name)).await?;
    println!("Downloaded {} from {}", name, bucket);
    Ok(())
}

async fn presign_url(store: &S3Store, profile: &Profile) -> Result<(), AppError> {
    let bucket = prompt_bucket(profile)?;
    let key = prompt("Enter the object name")?;
    let ttl = prompt_ttl()?;

    let url = store.presign_get(&bucket, &key, ttl).await?;
    println!("Pre-signed URL: {}", url);
    Ok(())
}

async fn list_versions(store: &S3Store, profile: &Profile) -> Result<(), AppError> {
    let bucket = prompt_bucket(profile)?;
    let key = prompt("Enter the object name")?;

    for version in store.list_versions(&bucket, &key).await? {
        let modified = version
            .last_modified
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        println!("Version: {} - Last Modified: {}", version.version_id, modified);
    }
    Ok(())
}

async fn delete_object(store: &S3Store, profile: &Profile) -> Result<(), AppError> {
    let bucket = prompt_bucket(profile)?;
    let key = prompt("Enter the object name to delete")?;

    store.delete_object(&bucket, &key).await?;
    println!("Deleted {} from {}", key, bucket);
    Ok(())
}

fn prompt(label: &str) -> Result<String, AppError> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(AppError::LocalIo("stdin closed".to_string()));
    }
    Ok(line.trim().to_string())
}

/// Empty reply falls back to the profile's default bucket when one is set.
fn prompt_bucket(profile: &Profile) -> Result<String, AppError> {
    loop {
        let value = prompt("Enter the S3 bucket name")?;
        if !value.is_empty() {
            return Ok(value);
        }
        if let Some(bucket) = &profile.bucket {
            return Ok(bucket.clone());
        }
        println!("Bucket name is required.");
    }
}

fn prompt_ttl() -> Result<Duration, AppError> {
    let value = prompt("Enter expiry in seconds (default 3600)")?;
    if value.is_empty() {
        return Ok(Duration::from_secs(DEFAULT_PRESIGN_TTL_SECS));
    }

    let secs: u64 = value
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid expiry: {}", value)))?;
    Ok(Duration::from_secs(secs))
}
