//! Directory-backed [`StorageClient`].
//!
//! Used when the bot runs with the local sink: saved files live under one
//! directory, the absolute file path stands in for a download link, and the
//! retention sweeper works against filesystem modification times exactly as
//! it does against the cloud listing.

use crate::traits::{RemoteFile, StorageClient, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Creates the directory if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl StorageClient for LocalStore {
    async fn upload(&self, data: Vec<u8>, name: &str) -> Result<String, StorageError> {
        let path = self.dir.join(name);
        tokio::fs::write(&path, data).await?;
        tracing::info!(path = %path.display(), "storage.saved_locally");
        Ok(path.display().to_string())
    }

    async fn temporary_link(&self, path: &str) -> Result<String, StorageError> {
        // A local file needs no link indirection.
        Ok(path.to_string())
    }

    async fn list_folder(&self) -> Result<Vec<RemoteFile>, StorageError> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let modified_at: DateTime<Utc> = meta.modified()?.into();
            files.push(RemoteFile {
                path: entry.path().display().to_string(),
                modified_at,
            });
        }
        Ok(files)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        tokio::fs::remove_file(path).await?;
        tracing::info!(path = %path, "storage.deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn upload_list_delete_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path().join("media")).unwrap();

        let stored = store
            .upload(b"clip-bytes".to_vec(), "alice_20230501_42_720x1280.mp4")
            .await
            .unwrap();
        assert!(stored.ends_with("alice_20230501_42_720x1280.mp4"));
        assert_eq!(store.temporary_link(&stored).await.unwrap(), stored);

        let listed = store.list_folder().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path, stored);

        store.delete(&stored).await.unwrap();
        assert!(store.list_folder().await.unwrap().is_empty());
    }

    #[test]
    fn new_creates_the_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("media");
        let store = LocalStore::new(&dir).unwrap();
        assert!(store.dir().is_dir());
    }
}
