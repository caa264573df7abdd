//! Request pacing for a quota-limited external API

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Spaces calls to one external service at least `interval` apart.
///
/// One instance per guarded service, shared by `Arc` across every caller
/// and every run. Each `acquire()` reserves its slot before suspending, so
/// concurrent callers always get distinct, strictly increasing slots.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    /// Earliest instant the next reservation may be released at.
    next_allowed: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_allowed: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until it is safe to issue one guarded request.
    pub async fn acquire(&self) {
        let slot = self.reserve();
        if slot > Instant::now() {
            tracing::trace!(wait_ms = (slot - Instant::now()).as_millis(), "Rate limiter pacing call");
        }
        tokio::time::sleep_until(slot).await;
    }

    /// Acquire a slot, then run `call`.
    pub async fn paced<F, T>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        self.acquire().await;
        call.await
    }

    /// Read-and-advance under the lock; no await happens while it is held.
    fn reserve(&self) -> Instant {
        let mut next = self
            .next_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let slot = next.map_or(now, |n| n.max(now));
        *next = Some(slot + self.interval);
        slot
    }
}
