//! Best-effort link shortening.
//!
//! The shortener is an optional collaborator: any failure falls back to the
//! raw link, never to a missing line in the reply.

use reclip_http::{HttpClient, HttpError, RequestOpts};

pub struct Shortener {
    http: HttpClient,
    endpoint: String,
}

impl Shortener {
    /// `endpoint` is a TinyURL-style service answering
    /// `GET {endpoint}?url=...` with the short URL as bare text.
    pub fn new(endpoint: &str) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::new(endpoint)?,
            endpoint: endpoint.to_string(),
        })
    }

    /// Short form of `url`, or `url` unchanged when the service fails.
    pub async fn shorten(&self, url: &str) -> String {
        let result = self
            .http
            .get_text(
                &self.endpoint,
                RequestOpts {
                    query: Some(vec![("url", url.into())]),
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await;
        match result {
            Ok(short) if short.starts_with("http") => short,
            Ok(other) => {
                tracing::warn!(reply = %other, "shortener returned a non-URL, keeping raw link");
                url.to_string()
            }
            Err(err) => {
                tracing::warn!(error = %err, "shortener unavailable, keeping raw link");
                url.to_string()
            }
        }
    }
}
