//! Stable error codes for CLI reporting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The queried object does not exist. For the backup decision this is
    /// a legitimate "upload" signal, never folded into `Storage`.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure, permission denial, throttling. Never converted
    /// into a default decision by the backup engine.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Local I/O error: {0}")]
    LocalIo(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::LocalIo(_) => "LOCAL_IO",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::LocalIo(e.to_string())
    }
}
