use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, PromptId, TransitionCause};

/// Stage of a scheduler tick, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickStep {
    Commands,
    Pomodoro,
    Water,
    Meals,
}

/// Every observable thing a tick does produces an Event.
/// The scheduler returns them for logging; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ConfigReloaded {
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        cause: TransitionCause,
        duration_secs: i64,
        prompt: Option<PromptId>,
        at: DateTime<Utc>,
    },
    WaterReminder {
        at: DateTime<Utc>,
    },
    MealReminder {
        timing: String,
        at: DateTime<Utc>,
    },
    /// A tick step failed; later steps still ran.
    StepFailed {
        step: TickStep,
        message: String,
        at: DateTime<Utc>,
    },
    ShutdownRequested {
        at: DateTime<Utc>,
    },
}
