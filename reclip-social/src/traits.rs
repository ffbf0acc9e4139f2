//! The client seam between the polling loop and the platform API.

use crate::twitter::types::{Status, User};
use async_trait::async_trait;
use reclip_http::HttpError;
use thiserror::Error;

/// The two failure kinds callers are expected to distinguish. Everything an
/// upstream can throw collapses into one of these; callers treat either as
/// "no result" and keep going.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("platform authentication failed: {0}")]
    Auth(String),
    #[error("platform API failure: {0}")]
    Api(String),
}

impl From<HttpError> for SocialError {
    fn from(err: HttpError) -> Self {
        if err.is_auth() {
            SocialError::Auth(err.to_string())
        } else {
            SocialError::Api(err.to_string())
        }
    }
}

/// One method per upstream REST call.
#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Mentions of the authenticated account, newest-first as the platform
    /// returns them, optionally restricted to ids after `since_id`.
    async fn mentions(
        &self,
        count: u32,
        since_id: Option<&str>,
    ) -> Result<Vec<Status>, SocialError>;

    /// Fetch a single status by id.
    async fn status(&self, id: &str) -> Result<Status, SocialError>;

    /// Post `text` threaded under the status `in_reply_to`.
    async fn reply(&self, in_reply_to: &str, text: &str) -> Result<Status, SocialError>;

    /// Favorite a status.
    async fn favorite(&self, status_id: &str) -> Result<(), SocialError>;

    /// Identity probe for the configured credentials.
    async fn verify_credentials(&self) -> Result<User, SocialError>;
}
