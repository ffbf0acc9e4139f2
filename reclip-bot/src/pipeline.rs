//! Per-mention processing.
//!
//! Every step short of posting the reply can make the pipeline walk away
//! from a mention; nothing a single mention does may disturb the rest of
//! the batch, so failures end in a log line and an early `Ok`.

use crate::fetch::MediaFetch;
use crate::pace::Pacing;
use crate::reply;
use crate::shorten::Shortener;
use crate::sink::MediaSink;
use crate::sweeper::Sweeper;
use crate::UploadedMedia;
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use reclip_social::twitter::extract::{self, VideoCandidate};
use reclip_social::twitter::types::Status;
use reclip_social::SocialClient;
use std::sync::Arc;

pub struct MentionPipeline {
    social: Arc<dyn SocialClient>,
    fetcher: Arc<dyn MediaFetch>,
    sink: Arc<dyn MediaSink>,
    sweeper: Sweeper,
    shortener: Option<Shortener>,
    pacing: Pacing,
    max_mention_age: Duration,
    retention_mins: i64,
}

impl MentionPipeline {
    pub fn new(
        social: Arc<dyn SocialClient>,
        fetcher: Arc<dyn MediaFetch>,
        sink: Arc<dyn MediaSink>,
        sweeper: Sweeper,
    ) -> Self {
        Self {
            social,
            fetcher,
            sink,
            sweeper,
            shortener: None,
            pacing: Pacing::default(),
            max_mention_age: Duration::seconds(100_000),
            retention_mins: 60,
        }
    }

    pub fn with_shortener(mut self, shortener: Shortener) -> Self {
        self.shortener = Some(shortener);
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Mentions older than this are skipped without a reply.
    pub fn with_max_mention_age(mut self, secs: u64) -> Self {
        self.max_mention_age = Duration::seconds(secs as i64);
        self
    }

    /// Only used for the expiry notice in the reply text; the sweeper
    /// carries its own copy of the window.
    pub fn with_retention_mins(mut self, mins: i64) -> Self {
        self.retention_mins = mins;
        self
    }

    /// Process one ordered batch. Per-mention failures are logged here and
    /// never propagate.
    pub async fn process_batch(&self, mentions: &[Status]) {
        for mention in mentions {
            if let Err(err) = self.process_mention(mention).await {
                tracing::warn!(id = %mention.id, error = %err, "mention skipped");
            }
        }
    }

    async fn process_mention(&self, mention: &Status) -> Result<()> {
        let created_at = extract::parse_created_at(&mention.created_at)
            .ok_or_else(|| anyhow!("unparsable created_at: {}", mention.created_at))?;
        let age = Utc::now().signed_duration_since(created_at);
        if age > self.max_mention_age {
            tracing::info!(id = %mention.id, age_secs = age.num_seconds(), "stale mention skipped");
            return Ok(());
        }

        let Some(source_id) = mention.in_reply_to_status_id.as_deref() else {
            tracing::info!(id = %mention.id, "mention is not a reply, nothing to extract");
            return Ok(());
        };
        let source = match self.social.status(source_id).await {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(id = %mention.id, source_id, error = %err, "source status unavailable");
                return Ok(());
            }
        };

        let candidates = extract::video_candidates(&source);
        if candidates.is_empty() {
            tracing::info!(id = %mention.id, source_id, "no video variants, not replying");
            return Ok(());
        }

        let uploads = self.rehost(&candidates).await;
        if uploads.is_empty() {
            tracing::warn!(id = %mention.id, "every variant failed, not replying");
            return Ok(());
        }

        let text = reply::format_reply(&mention.user.screen_name, &uploads, self.retention_mins);
        if let Err(err) = self.social.reply(&mention.id, &text).await {
            tracing::warn!(id = %mention.id, error = %err, "reply failed");
        }
        self.pacing.pause_between_actions().await;
        if let Err(err) = self.social.favorite(&mention.id).await {
            tracing::warn!(id = %mention.id, error = %err, "favorite failed");
        }

        self.sweeper.sweep().await;
        Ok(())
    }

    /// Download and store every candidate; a variant that fails either leg
    /// is dropped from the result, not retried.
    async fn rehost(&self, candidates: &[VideoCandidate]) -> Vec<UploadedMedia> {
        let mut uploads = Vec::new();
        for candidate in candidates {
            let bytes = match self.fetcher.fetch(&candidate.url).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(url = %candidate.url, error = %err, "variant download failed");
                    continue;
                }
            };
            let link = match self.sink.store(bytes, &candidate.filename).await {
                Ok(link) => link,
                Err(err) => {
                    tracing::warn!(filename = %candidate.filename, error = %err, "variant store failed");
                    continue;
                }
            };
            let link = match &self.shortener {
                Some(shortener) => shortener.shorten(&link).await,
                None => link,
            };
            uploads.push(UploadedMedia {
                resolution: candidate.resolution.clone(),
                link,
            });
        }
        uploads
    }
}
