//! Retention eviction for re-hosted files.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use reclip_storage::{RemoteFile, StorageClient};
use std::sync::Arc;

pub struct Sweeper {
    storage: Arc<dyn StorageClient>,
    retention: Duration,
    /// Both sides of the age comparison are converted into this zone first.
    zone: Tz,
}

impl Sweeper {
    pub fn new(storage: Arc<dyn StorageClient>, retention_mins: i64, zone: Tz) -> Self {
        Self {
            storage,
            retention: Duration::minutes(retention_mins),
            zone,
        }
    }

    /// One sweep over the stored files. Failures are logged per file; the
    /// rest of the sweep always proceeds.
    pub async fn sweep(&self) {
        let files = match self.storage.list_folder().await {
            Ok(files) => files,
            Err(err) => {
                tracing::warn!(error = %err, "sweeper could not list folder");
                return;
            }
        };

        let now = Utc::now();
        for file in files {
            if !is_expired(&file, now, self.retention, self.zone) {
                continue;
            }
            tracing::info!(path = %file.path, "sweeper removing expired file");
            if let Err(err) = self.storage.delete(&file.path).await {
                tracing::warn!(path = %file.path, error = %err, "sweeper delete failed");
            }
        }
    }
}

/// A file is expired when its modification time is *strictly* older than
/// `now - retention`; a file exactly at the boundary is retained.
pub fn is_expired(file: &RemoteFile, now: DateTime<Utc>, retention: Duration, zone: Tz) -> bool {
    let cutoff = now.with_timezone(&zone) - retention;
    file.modified_at.with_timezone(&zone) < cutoff
}
