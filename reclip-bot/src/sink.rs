//! Where re-hosted media ends up.
//!
//! The two sinks correspond to the two deployment shapes: upload-and-link
//! against cloud storage, or plain files under a local directory.

use async_trait::async_trait;
use reclip_storage::{LocalStore, StorageClient, StorageError};
use std::path::PathBuf;
use std::sync::Arc;

#[async_trait]
pub trait MediaSink: Send + Sync {
    /// Store the bytes under `filename` and return the link to advertise in
    /// the reply.
    async fn store(&self, data: Vec<u8>, filename: &str) -> Result<String, StorageError>;
}

/// Upload to cloud storage, advertise a temporary download link.
pub struct CloudLinkSink {
    storage: Arc<dyn StorageClient>,
}

impl CloudLinkSink {
    pub fn new(storage: Arc<dyn StorageClient>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl MediaSink for CloudLinkSink {
    async fn store(&self, data: Vec<u8>, filename: &str) -> Result<String, StorageError> {
        let path = self.storage.upload(data, filename).await?;
        self.storage.temporary_link(&path).await
    }
}

/// Save under a local directory; the file path stands in for the link.
pub struct LocalFileSink {
    store: LocalStore,
}

impl LocalFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Ok(Self {
            store: LocalStore::new(dir)?,
        })
    }
}

#[async_trait]
impl MediaSink for LocalFileSink {
    async fn store(&self, data: Vec<u8>, filename: &str) -> Result<String, StorageError> {
        self.store.upload(data, filename).await
    }
}
