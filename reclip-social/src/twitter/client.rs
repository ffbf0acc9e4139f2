//! Thin wrapper around the platform's v1.1-style REST endpoints.
//!
//! Each method is exactly one upstream call; auth and error translation
//! happen here so callers only ever see [`SocialError`].

use crate::traits::{SocialClient, SocialError};
use crate::twitter::types::{Status, User};
use async_trait::async_trait;
use reclip_http::{Auth, HttpClient, HttpError, RequestOpts};
use std::borrow::Cow;

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    pub fn new(api_base: &str, bearer_token: String) -> Result<Self, HttpError> {
        let http = HttpClient::new(api_base)?;
        Ok(Self {
            http,
            bearer: bearer_token,
        })
    }

    fn opts<'a>(&'a self, query: Vec<(&'a str, Cow<'a, str>)>) -> RequestOpts<'a> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.bearer)),
            query: Some(query),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SocialClient for TwitterApi {
    async fn mentions(
        &self,
        count: u32,
        since_id: Option<&str>,
    ) -> Result<Vec<Status>, SocialError> {
        let mut query: Vec<(&str, Cow<'_, str>)> = vec![
            ("count", count.to_string().into()),
            ("tweet_mode", "extended".into()),
        ];
        if let Some(id) = since_id {
            query.push(("since_id", id.into()));
        }
        let statuses: Vec<Status> = self
            .http
            .get_json("1.1/statuses/mentions_timeline.json", self.opts(query))
            .await?;
        tracing::debug!(count = statuses.len(), "twitter.mentions");
        Ok(statuses)
    }

    async fn status(&self, id: &str) -> Result<Status, SocialError> {
        let query: Vec<(&str, Cow<'_, str>)> =
            vec![("id", id.into()), ("tweet_mode", "extended".into())];
        let status = self
            .http
            .get_json("1.1/statuses/show.json", self.opts(query))
            .await?;
        Ok(status)
    }

    async fn reply(&self, in_reply_to: &str, text: &str) -> Result<Status, SocialError> {
        let query: Vec<(&str, Cow<'_, str>)> = vec![
            ("status", text.into()),
            ("in_reply_to_status_id", in_reply_to.into()),
            ("auto_populate_reply_metadata", "true".into()),
        ];
        let posted: Status = self
            .http
            .post_json_empty("1.1/statuses/update.json", self.opts(query))
            .await?;
        tracing::info!(id = %posted.id, in_reply_to, "twitter.reply_posted");
        Ok(posted)
    }

    async fn favorite(&self, status_id: &str) -> Result<(), SocialError> {
        let query: Vec<(&str, Cow<'_, str>)> = vec![("id", status_id.into())];
        let _: Status = self
            .http
            .post_json_empty("1.1/favorites/create.json", self.opts(query))
            .await?;
        Ok(())
    }

    async fn verify_credentials(&self) -> Result<User, SocialError> {
        let user: User = self
            .http
            .get_json("1.1/account/verify_credentials.json", self.opts(vec![]))
            .await?;
        Ok(user)
    }
}
