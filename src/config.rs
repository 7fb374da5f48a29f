//! Profile file with connection defaults (endpoint, credentials, bucket).

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Used when a bucket prompt is left empty.
    pub bucket: Option<String>,
}

impl Profile {
    /// Default profile location under the platform config dir.
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("buckup").join("profile.json")
    }

    /// Load a profile from disk. A missing file is not an error; it yields
    /// an empty profile so flags and env vars alone are enough to run.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Read profile {:?}: {}", path, e)))?;

        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("Parse profile {:?}: {}", path, e)))
    }

    /// Overlay values from flags/env on top of the file: explicit values win.
    pub fn merged_with(
        self,
        endpoint: Option<String>,
        region: Option<String>,
        access_key: Option<String>,
        secret_key: Option<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.or(self.endpoint),
            region: region.or(self.region),
            access_key: access_key.or(self.access_key),
            secret_key: secret_key.or(self.secret_key),
            bucket: self.bucket,
        }
    }

    /// Static credentials are only usable as a pair.
    pub fn static_credentials(&self) -> Result<Option<(String, String)>, AppError> {
        match (&self.access_key, &self.secret_key) {
            (Some(ak), Some(sk)) => Ok(Some((ak.clone(), sk.clone()))),
            (None, None) => Ok(None),
            _ => Err(AppError::Config(
                "access key and secret key must be provided together".to_string(),
            )),
        }
    }
}
