//! Pacing gates in front of the external services.
//!
//! A gate releases immediately the first time, then no sooner than `interval` after its
//! previous release. Time comes from `tokio::time`, so tests drive it with a paused clock.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits until the next call slot is available and claims it.
    async fn ready(&self);
}

pub struct IntervalGate {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Claims the next slot and returns the instant it opens.
    fn claim(&self) -> Instant {
        let now = Instant::now();
        let mut next_slot = match self.next_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slot = next_slot.map_or(now, |next| next.max(now));
        *next_slot = Some(slot + self.interval);
        slot
    }
}

#[async_trait]
impl Pacer for IntervalGate {
    async fn ready(&self) {
        let slot = self.claim();
        if slot > Instant::now() {
            tokio::time::sleep_until(slot).await;
        }
    }
}
