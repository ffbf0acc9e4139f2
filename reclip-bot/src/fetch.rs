//! Bounded download of a selected media variant.

use async_trait::async_trait;
use reclip_http::{HttpClient, HttpError, RequestOpts};
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// The download leg of the pipeline, separated so tests can feed bytes in
/// without a network.
#[async_trait]
pub trait MediaFetch: Send + Sync {
    /// Raw bytes of `url`. A non-2xx response or a timeout fails this one
    /// variant only.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

pub struct HttpFetcher {
    http: HttpClient,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, HttpError> {
        // Variant URLs are absolute; the base only anchors relative paths
        // that never occur in practice.
        Ok(Self {
            http: HttpClient::new("https://video.twimg.com")?,
            timeout: DEFAULT_FETCH_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl MediaFetch for HttpFetcher {
    // FIXME: stream large downloads to a temp file instead of buffering the
    // whole video in memory.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.http
            .get_bytes(
                url,
                RequestOpts {
                    timeout: Some(self.timeout),
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await
    }
}
