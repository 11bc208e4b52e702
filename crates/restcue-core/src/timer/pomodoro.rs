//! Pomodoro work/break state machine.
//!
//! Like the rest of the timer code this is a wall-clock state machine with no
//! internal thread: the scheduler calls [`PomodoroStateMachine::tick`] on
//! every iteration and forwards user answers as explicit commands.
//!
//! ## State Transitions
//!
//! ```text
//! Work ──elapsed──▶ BreakPending ──start_break──▶ Break ──elapsed / cancel──▶ Work
//!                      │    ▲
//!              remind_later elapsed
//!                      ▼    │
//!                    RemindLater
//! ```
//!
//! Every interactive surface the core asks for (the break confirmation and
//! the break overlay) is tagged with a [`PromptId`]. A command is accepted
//! only when it names the prompt currently outstanding, and accepting it
//! consumes that prompt, so a double click or a late answer from an old
//! window can never trigger a second transition.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::storage::PomodoroConfig;

/// Length of a "remind me later" deferral, independent of config.
pub const REMIND_LATER_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    BreakPending,
    Break,
    RemindLater,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "WORK",
            Phase::BreakPending => "BREAK_PENDING",
            Phase::Break => "BREAK",
            Phase::RemindLater => "REMIND_LATER",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one presented prompt instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PromptId(u64);

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What caused a phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    Elapsed,
    StartBreak,
    RemindLater,
    CancelBreak,
}

/// A phase change, reported exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub cause: TransitionCause,
    pub duration: Duration,
    /// Prompt to present for the new phase, if it has one.
    pub prompt: Option<PromptId>,
}

/// Serializable view of the machine at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroStatus {
    pub phase: Phase,
    pub remaining_secs: i64,
    pub duration_secs: i64,
    pub prompt: Option<PromptId>,
}

#[derive(Debug, Clone)]
pub struct PomodoroStateMachine {
    phase: Phase,
    phase_start: DateTime<Utc>,
    phase_duration: Duration,
    prompt: Option<PromptId>,
    next_prompt: u64,
}

impl PomodoroStateMachine {
    /// Start in WORK at `now`.
    pub fn new(now: DateTime<Utc>, work_duration: Duration) -> Self {
        Self {
            phase: Phase::Work,
            phase_start: now,
            phase_duration: work_duration,
            prompt: None,
            next_prompt: 1,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_start(&self) -> DateTime<Utc> {
        self.phase_start
    }

    pub fn phase_duration(&self) -> Duration {
        self.phase_duration
    }

    /// The prompt the current phase is waiting on, if any.
    pub fn outstanding_prompt(&self) -> Option<PromptId> {
        self.prompt
    }

    /// Time elapsed in the current phase. A clock that moved backwards
    /// counts as zero.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.phase_start).max(Duration::zero())
    }

    /// `max(0, duration - elapsed)`.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.phase_duration - self.elapsed(now)).max(Duration::zero())
    }

    pub fn status(&self, now: DateTime<Utc>) -> PomodoroStatus {
        PomodoroStatus {
            phase: self.phase,
            remaining_secs: self.remaining(now).num_seconds(),
            duration_secs: self.phase_duration.num_seconds(),
            prompt: self.prompt,
        }
    }

    // ── Ticking ──────────────────────────────────────────────────────

    /// Advance on elapsed time.
    ///
    /// Calling this repeatedly with the same `now` never yields a second
    /// transition: every transition restarts the phase clock at `now`, and
    /// BREAK_PENDING has no timed exit.
    ///
    /// # Errors
    ///
    /// Returns an error when a BREAK ends and the configured work length is
    /// invalid; the machine stays in BREAK and retries on the next tick.
    pub fn tick(
        &mut self,
        now: DateTime<Utc>,
        config: &PomodoroConfig,
    ) -> Result<Option<Transition>, ConfigError> {
        if self.phase == Phase::BreakPending || self.elapsed(now) < self.phase_duration {
            return Ok(None);
        }

        let transition = match self.phase {
            Phase::Work | Phase::RemindLater => {
                let prompt = self.allocate_prompt();
                // BREAK_PENDING keeps the old duration; it has no timed exit.
                let duration = self.phase_duration;
                self.enter(Phase::BreakPending, now, duration, TransitionCause::Elapsed, Some(prompt))
            }
            Phase::Break => {
                let work = config.work_duration()?;
                self.enter(Phase::Work, now, work, TransitionCause::Elapsed, None)
            }
            Phase::BreakPending => return Ok(None),
        };
        Ok(Some(transition))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Answer "start break" on the confirmation `prompt`.
    ///
    /// The break length comes from `config` as it is right now.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured break length is invalid; the
    /// prompt stays outstanding so it can be presented again.
    pub fn start_break(
        &mut self,
        now: DateTime<Utc>,
        config: &PomodoroConfig,
        prompt: PromptId,
    ) -> Result<Option<Transition>, ConfigError> {
        if !self.accepts(Phase::BreakPending, prompt, "start_break") {
            return Ok(None);
        }
        let duration = config.break_duration()?;
        let overlay = self.allocate_prompt();
        Ok(Some(self.enter(
            Phase::Break,
            now,
            duration,
            TransitionCause::StartBreak,
            Some(overlay),
        )))
    }

    /// Answer "remind later" on the confirmation `prompt`.
    pub fn remind_later(&mut self, now: DateTime<Utc>, prompt: PromptId) -> Option<Transition> {
        if !self.accepts(Phase::BreakPending, prompt, "remind_later") {
            return None;
        }
        Some(self.enter(
            Phase::RemindLater,
            now,
            Duration::seconds(REMIND_LATER_SECS),
            TransitionCause::RemindLater,
            None,
        ))
    }

    /// Answer "cancel" on the break overlay `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured work length is invalid; the
    /// machine stays in BREAK with the overlay prompt still outstanding.
    pub fn cancel_break(
        &mut self,
        now: DateTime<Utc>,
        config: &PomodoroConfig,
        prompt: PromptId,
    ) -> Result<Option<Transition>, ConfigError> {
        if !self.accepts(Phase::Break, prompt, "cancel_break") {
            return Ok(None);
        }
        let work = config.work_duration()?;
        Ok(Some(self.enter(
            Phase::Work,
            now,
            work,
            TransitionCause::CancelBreak,
            None,
        )))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn accepts(&self, phase: Phase, prompt: PromptId, command: &str) -> bool {
        let ok = self.phase == phase && self.prompt == Some(prompt);
        if !ok {
            debug!(
                command,
                %prompt,
                phase = %self.phase,
                outstanding = ?self.prompt,
                "Ignoring command for stale or unknown prompt"
            );
        }
        ok
    }

    fn allocate_prompt(&mut self) -> PromptId {
        let id = PromptId(self.next_prompt);
        self.next_prompt += 1;
        id
    }

    fn enter(
        &mut self,
        to: Phase,
        now: DateTime<Utc>,
        duration: Duration,
        cause: TransitionCause,
        prompt: Option<PromptId>,
    ) -> Transition {
        let from = self.phase;
        self.phase = to;
        self.phase_start = now;
        self.phase_duration = duration;
        self.prompt = prompt;
        info!(
            %from,
            %to,
            ?cause,
            duration_secs = duration.num_seconds(),
            "Pomodoro phase changed"
        );
        Transition {
            from,
            to,
            cause,
            duration,
            prompt,
        }
    }
}
