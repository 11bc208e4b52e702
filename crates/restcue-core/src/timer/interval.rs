//! "Has N seconds elapsed since the baseline" timer used by the water check.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    last_reset: DateTime<Utc>,
}

impl IntervalTimer {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { last_reset: now }
    }

    pub fn last_reset(&self) -> DateTime<Utc> {
        self.last_reset
    }

    /// Move the baseline to `now` without firing.
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.last_reset = now;
    }

    /// Fire once `interval` has elapsed since the baseline.
    ///
    /// Firing moves the baseline to `now` rather than to the interval
    /// boundary, so a late tick delays the next fire instead of shortening it.
    pub fn poll(&mut self, now: DateTime<Utc>, interval: Duration) -> bool {
        if now - self.last_reset >= interval {
            self.last_reset = now;
            true
        } else {
            false
        }
    }
}
