mod interval;
mod meal;
mod pomodoro;

pub use interval::IntervalTimer;
pub use meal::MealTimer;
pub use pomodoro::{
    Phase, PomodoroStateMachine, PomodoroStatus, PromptId, Transition, TransitionCause,
    REMIND_LATER_SECS,
};
