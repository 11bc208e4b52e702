//! # Restcue Core Library
//!
//! Scheduling core of the restcue wellness-reminder daemon: a Pomodoro
//! work/break cycle, a periodic water reminder, and fixed-time meal
//! reminders, all driven from one cooperative tick loop.
//!
//! ## Architecture
//!
//! - **Timers**: wall-clock state machines that require the caller to
//!   periodically invoke `tick()`/`poll()` with the current instant
//! - **Storage**: TOML configuration with hot reload on file change
//! - **Gateway**: trait boundary to the window layer; user answers come back
//!   as queued commands
//! - **Scheduler**: the single-threaded loop tying the above together
//!
//! ## Key Components
//!
//! - [`ReminderScheduler`]: the tick loop
//! - [`PomodoroStateMachine`]: WORK / BREAK_PENDING / BREAK / REMIND_LATER
//! - [`ConfigStore`]: live configuration
//! - [`PresentationGateway`]: trait implemented by display adapters

pub mod clock;
pub mod error;
pub mod events;
pub mod gateway;
pub mod scheduler;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, PresentationError};
pub use events::{Event, TickStep};
pub use gateway::{
    format_countdown, CommandSender, FullscreenMessage, IconRef, OverlayKind,
    PresentationGateway, UserCommand,
};
pub use scheduler::{
    FixedSleepPacer, ReminderScheduler, SchedulerContext, ShutdownHandle, TickPacer,
};
pub use storage::{Config, ConfigStore, MealsConfig, PomodoroConfig, WaterConfig};
pub use timer::{
    IntervalTimer, MealTimer, Phase, PomodoroStateMachine, PomodoroStatus, PromptId, Transition,
    TransitionCause,
};
