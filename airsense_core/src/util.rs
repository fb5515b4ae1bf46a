//! Retry pacing helpers for airsense_core.

use std::time::Duration;

/// Capped exponential backoff: `initial, 2*initial, 4*initial, ... max, max, ...`.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    /// `max` below `initial` is raised to `initial`.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next: initial,
            max: max.max(initial),
        }
    }

    /// Delay to sleep before the next retry; advances the schedule.
    #[inline]
    pub fn next_delay(&mut self) -> Duration {
        let d = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        d
    }
}
