//! Wall clock and tick source.
//!
//! The controller reads wall time only to stamp session logs. Countdown
//! progress comes exclusively from ticks, one per elapsed period.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Source of wall-clock timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hands out tick subscriptions with a fixed period.
#[derive(Debug, Clone, Copy)]
pub struct TickSource {
    period: Duration,
}

impl TickSource {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// One tick per second.
    pub fn seconds() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// Start a new subscription. The first tick fires one full period from now.
    pub fn subscribe(&self) -> TickSubscription {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        TickSubscription { interval }
    }
}

impl Default for TickSource {
    fn default() -> Self {
        Self::seconds()
    }
}

/// A live tick subscription.
///
/// Ticks are produced lazily when polled, so once the subscription is
/// cancelled or dropped nothing can be delivered for it.
#[derive(Debug)]
pub struct TickSubscription {
    interval: Interval,
}

impl TickSubscription {
    /// Wait for the next elapsed period.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    pub fn cancel(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_a_full_period() {
        let source = TickSource::seconds();
        let started = Instant::now();
        let mut sub = source.subscribe();
        sub.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        sub.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
