//! Settlement waits
//!
//! Scenarios synchronise with the application by pausing for a fixed tier.
//! Infrastructure (servers, bridges) uses [`wait_until`] instead.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};

const MAX_BACKOFF: Duration = Duration::from_secs(1);

/// Suspend for at least `duration`. No early wake, no cancellation.
pub async fn wait(duration: Duration) {
    sleep(duration).await;
}

/// Named pause lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Instantaneous UI reactions
    Short,
    /// Debounced or single round-trip actions
    Medium,
    /// Application bootstrap and multi-step remote loads
    Long,
}

/// Durations behind each [`Tier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayTiers {
    pub short_ms: u64,
    pub medium_ms: u64,
    pub long_ms: u64,
}

impl Default for DelayTiers {
    fn default() -> Self {
        Self {
            short_ms: 100,
            medium_ms: 500,
            long_ms: 1000,
        }
    }
}

impl DelayTiers {
    pub fn duration(&self, tier: Tier) -> Duration {
        let ms = match tier {
            Tier::Short => self.short_ms,
            Tier::Medium => self.medium_ms,
            Tier::Long => self.long_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Poll `ready` until it returns true, doubling the pause between attempts.
///
/// Fails with [`E2eError::Timeout`] naming `what` once `timeout` has elapsed.
pub async fn wait_until<P, Fut>(
    what: &str,
    timeout: Duration,
    initial_backoff: Duration,
    mut ready: P,
) -> E2eResult<()>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    let mut backoff = initial_backoff;
    let mut attempts = 0usize;

    loop {
        attempts += 1;
        if ready().await {
            debug!("{} ready after {} attempt(s)", what, attempts);
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(E2eError::Timeout(format!("{} ({} attempts)", what, attempts)));
        }

        sleep(backoff.min(deadline - now)).await;
        backoff = backoff.saturating_mul(2).min(MAX_BACKOFF);
    }
}
