//! Explicit pacing between upstream calls.
//!
//! The delays keep the bot polite towards upstream rate limits; they are
//! not needed for correctness, which is why [`Pacing::none`] exists for
//! tests.

use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause after each mention fetch, before the batch is processed.
    pub after_fetch: Duration,
    /// Pause between consecutive write actions (reply, favorite).
    pub between_actions: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_fetch: Duration::from_secs(2),
            between_actions: Duration::from_secs(1),
        }
    }
}

impl Pacing {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            after_fetch: Duration::ZERO,
            between_actions: Duration::ZERO,
        }
    }

    pub fn from_millis(after_fetch_ms: u64, between_actions_ms: u64) -> Self {
        Self {
            after_fetch: Duration::from_millis(after_fetch_ms),
            between_actions: Duration::from_millis(between_actions_ms),
        }
    }

    pub async fn pause_after_fetch(&self) {
        if !self.after_fetch.is_zero() {
            sleep(self.after_fetch).await;
        }
    }

    pub async fn pause_between_actions(&self) {
        if !self.between_actions.is_zero() {
            sleep(self.between_actions).await;
        }
    }
}
