//! The seam between the bot and whatever holds the re-hosted files.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reclip_http::HttpError;
use thiserror::Error;

/// The two failure kinds callers distinguish; either one means "that file
/// operation produced nothing" and must never abort a batch.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage authentication failed: {0}")]
    Auth(String),
    #[error("storage API failure: {0}")]
    Api(String),
}

impl From<HttpError> for StorageError {
    fn from(err: HttpError) -> Self {
        if err.is_auth() {
            StorageError::Auth(err.to_string())
        } else {
            StorageError::Api(err.to_string())
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Api(err.to_string())
    }
}

/// One stored file as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub modified_at: DateTime<Utc>,
}

/// One method per upstream operation.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Store `data` as `name` inside the configured folder; returns the
    /// stored path.
    async fn upload(&self, data: Vec<u8>, name: &str) -> Result<String, StorageError>;

    /// Time-limited download URL for a stored path.
    async fn temporary_link(&self, path: &str) -> Result<String, StorageError>;

    /// Every file currently in the configured folder.
    async fn list_folder(&self) -> Result<Vec<RemoteFile>, StorageError>;

    /// Remove one stored file.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}
