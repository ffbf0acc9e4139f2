//! Config-driven wiring of the client stack.

use anyhow::{anyhow, Context, Result};
use reclip_bot::fetch::HttpFetcher;
use reclip_bot::pace::Pacing;
use reclip_bot::pipeline::MentionPipeline;
use reclip_bot::poller::Poller;
use reclip_bot::shorten::Shortener;
use reclip_bot::sink::{CloudLinkSink, LocalFileSink, MediaSink};
use reclip_bot::sweeper::Sweeper;
use reclip_config::{ReclipConfig, SinkConfig};
use reclip_social::{SocialClient, TwitterApi};
use reclip_storage::{DropboxApi, LocalStore, StorageClient};
use std::sync::Arc;
use std::time::Duration;

/// Build the fully wired poller from loaded configuration.
pub async fn build(cfg: &ReclipConfig) -> Result<Poller> {
    let social: Arc<dyn SocialClient> = Arc::new(
        TwitterApi::new(&cfg.social.api_base, cfg.social.bearer_token.clone())
            .context("building social client")?,
    );

    // Identity probe. A failure here degrades into the same logged auth
    // errors the loop would hit anyway, so it does not stop the start.
    match social.verify_credentials().await {
        Ok(user) => tracing::info!(screen_name = %user.screen_name, "authenticated"),
        Err(err) => tracing::warn!(error = %err, "credential probe failed, continuing"),
    }

    // The sink and the sweeper share one storage backend so retention
    // eviction works for both deployment shapes.
    let (sink, storage): (Arc<dyn MediaSink>, Arc<dyn StorageClient>) = match &cfg.sink {
        SinkConfig::Cloud => {
            // Presence is validated at load time; guarded again here.
            let sc = cfg
                .storage
                .as_ref()
                .context("cloud sink without storage credentials")?;
            let dropbox: Arc<dyn StorageClient> = Arc::new(
                DropboxApi::new(
                    &sc.api_base,
                    &sc.content_base,
                    sc.access_token.clone(),
                    sc.folder.clone(),
                )
                .context("building storage client")?,
            );
            (Arc::new(CloudLinkSink::new(dropbox.clone())), dropbox)
        }
        SinkConfig::Local { path } => {
            let sink = LocalFileSink::new(path)
                .with_context(|| format!("preparing local sink at {path}"))?;
            let store: Arc<dyn StorageClient> = Arc::new(
                LocalStore::new(path).with_context(|| format!("preparing local store at {path}"))?,
            );
            (Arc::new(sink), store)
        }
    };

    let zone: chrono_tz::Tz = cfg
        .retention
        .reference_zone
        .parse()
        .map_err(|e| anyhow!("bad retention.reference_zone: {e}"))?;
    let sweeper = Sweeper::new(storage, cfg.retention.window_mins, zone);

    let pacing = Pacing::from_millis(cfg.pacing.after_fetch_ms, cfg.pacing.between_actions_ms);
    let fetcher = Arc::new(HttpFetcher::new().context("building media fetcher")?);

    let mut pipeline = MentionPipeline::new(social.clone(), fetcher, sink, sweeper)
        .with_pacing(pacing)
        .with_max_mention_age(cfg.poll.max_mention_age_secs)
        .with_retention_mins(cfg.retention.window_mins);
    if let Some(shortener) = &cfg.shortener {
        pipeline = pipeline.with_shortener(
            Shortener::new(&shortener.endpoint).context("building shortener")?,
        );
    }

    Ok(Poller::new(
        social,
        pipeline,
        Duration::from_secs(cfg.poll.interval_secs),
        cfg.poll.batch_size,
    )
    .with_pacing(pacing))
}
