//! Error types for Tincture Core

use thiserror::Error;

/// Main error type for Tincture operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Theme error: {0}")]
    Theme(#[from] ThemeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Theme model errors
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Theme not found: {0}")]
    NotFound(String),

    #[error("Theme is read-only: {0}")]
    ReadOnly(String),

    #[error("Invalid legacy theme {id}: {reason}")]
    InvalidLegacyTheme { id: String, reason: String },

    #[error("Invalid token {token}: {reason}")]
    InvalidToken { token: String, reason: String },

    #[error("Invalid share code: {0}")]
    InvalidShareCode(String),

    #[error("Unsupported theme version: {0}")]
    UnsupportedVersion(u32),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Storage(StorageError::Pool(err.to_string()))
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
