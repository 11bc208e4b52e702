//! Fixed wall-clock meal reminders.
//!
//! The scheduler polls many times per minute, so each configured `HH:MM`
//! must fire exactly once while the clock shows that minute. A single
//! remembered key is enough because timings are distinct minute stamps.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealTimer {
    last_fired: Option<String>,
}

impl MealTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minute most recently handled, if the clock is still on it.
    pub fn last_fired(&self) -> Option<&str> {
        self.last_fired.as_deref()
    }

    /// Returns `true` when `current_minute` is a configured timing that has
    /// not fired yet during this minute.
    ///
    /// The remembered key is dropped as soon as the clock leaves its minute,
    /// so it can only ever suppress the minute it was fired for. The same
    /// timing fires again the next day, and timings added on a reload are
    /// never shadowed by an old key.
    pub fn poll(&mut self, current_minute: &str, timings: &BTreeSet<String>) -> bool {
        if self
            .last_fired
            .as_deref()
            .is_some_and(|fired| fired != current_minute)
        {
            self.last_fired = None;
        }

        if self.last_fired.is_some() || !timings.contains(current_minute) {
            return false;
        }

        self.last_fired = Some(current_minute.to_string());
        true
    }
}
