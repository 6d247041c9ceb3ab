#![forbid(unsafe_code)]

//! Manually advanced monotonic time.

use std::time::Duration;

/// Frame length the simulated browser ticks at.
pub const FRAME: Duration = Duration::from_millis(16);

/// A clock that only moves when told to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    now: Duration,
}

impl SimClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Jump to `now`. Time never runs backwards; earlier values are ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}
