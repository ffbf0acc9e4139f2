//! The fixed-cadence polling loop and its timeline cursor.

use crate::pace::Pacing;
use crate::pipeline::MentionPipeline;
use reclip_social::twitter::extract::parse_created_at;
use reclip_social::twitter::types::Status;
use reclip_social::SocialClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// In-memory cursor over the mention timeline. Once set, `last_id` only
/// moves forward; it does not survive a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    pub last_id: Option<String>,
}

/// Extension point for deployments that want the cursor to survive
/// restarts. The bot never requires it; the hook observes every advance and
/// can write it wherever it likes.
pub trait PollStatePersist: Send + Sync {
    fn advanced(&self, state: &PollState);
}

pub struct Poller {
    social: Arc<dyn SocialClient>,
    pipeline: MentionPipeline,
    interval: Duration,
    batch_size: u32,
    pacing: Pacing,
    persist: Option<Arc<dyn PollStatePersist>>,
}

impl Poller {
    pub fn new(
        social: Arc<dyn SocialClient>,
        pipeline: MentionPipeline,
        interval: Duration,
        batch_size: u32,
    ) -> Self {
        Self {
            social,
            pipeline,
            interval,
            batch_size,
            pacing: Pacing::default(),
            persist: None,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_persistence(mut self, hook: Arc<dyn PollStatePersist>) -> Self {
        self.persist = Some(hook);
        self
    }

    /// One polling cycle: fetch, order, advance the cursor, process. The
    /// returned state feeds the next cycle; a cycle that sees nothing (or
    /// fails to fetch) hands the state back untouched.
    pub async fn cycle(&self, state: PollState) -> PollState {
        let mentions = match self
            .social
            .mentions(self.batch_size, state.last_id.as_deref())
            .await
        {
            Ok(mentions) => mentions,
            Err(err) => {
                tracing::warn!(error = %err, "mention fetch failed");
                return state;
            }
        };
        self.pacing.pause_after_fetch().await;

        if mentions.is_empty() {
            tracing::debug!(last_id = ?state.last_id, "no new mentions");
            return state;
        }

        let ordered = order_by_date(mentions);
        let next = PollState {
            last_id: Some(ordered[0].id.clone()),
        };
        tracing::info!(last_id = %ordered[0].id, batch = ordered.len(), "cursor advanced");
        if let Some(hook) = &self.persist {
            hook.advanced(&next);
        }

        self.pipeline.process_batch(&ordered).await;
        next
    }

    /// Run cycles until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut state = PollState::default();
        loop {
            state = self.cycle(state).await;
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("poller stopping");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

/// Most recent first. Unparsable timestamps sort last; equal timestamps
/// keep their fetch order (the sort is stable).
pub fn order_by_date(mut mentions: Vec<Status>) -> Vec<Status> {
    mentions.sort_by_cached_key(|m| std::cmp::Reverse(parse_created_at(&m.created_at)));
    mentions
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclip_social::twitter::types::User;

    fn mention(id: &str, created_at: &str) -> Status {
        Status {
            id: id.to_string(),
            text: None,
            created_at: created_at.to_string(),
            in_reply_to_status_id: None,
            user: User {
                screen_name: "alice".into(),
                name: None,
            },
            extended_entities: None,
        }
    }

    #[test]
    fn orders_most_recent_first() {
        let batch = vec![
            mention("1", "Mon May 01 08:00:00 +0000 2023"),
            mention("3", "Mon May 01 12:00:00 +0000 2023"),
            mention("2", "Mon May 01 10:00:00 +0000 2023"),
        ];
        let ordered = order_by_date(batch);
        let ids: Vec<_> = ordered.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn single_element_batch_is_unchanged() {
        let batch = vec![mention("1", "Mon May 01 08:00:00 +0000 2023")];
        let ordered = order_by_date(batch);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].id, "1");
    }

    #[test]
    fn ties_preserve_fetch_order() {
        let batch = vec![
            mention("a", "Mon May 01 08:00:00 +0000 2023"),
            mention("b", "Mon May 01 08:00:00 +0000 2023"),
            mention("c", "Mon May 01 09:00:00 +0000 2023"),
        ];
        let ordered = order_by_date(batch);
        let ids: Vec<_> = ordered.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn unparsable_timestamps_sort_last() {
        let batch = vec![
            mention("x", "garbage"),
            mention("y", "Mon May 01 08:00:00 +0000 2023"),
        ];
        let ordered = order_by_date(batch);
        let ids: Vec<_> = ordered.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "x"]);
    }
}
