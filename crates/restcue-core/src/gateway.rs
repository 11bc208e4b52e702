//! Boundary between the scheduling core and whatever draws windows.
//!
//! The core only ever *requests* presentation through [`PresentationGateway`];
//! every request returns immediately. Answers from the user travel the other
//! way as [`UserCommand`]s pushed into the scheduler's inbound queue through a
//! [`CommandSender`], and are applied on the next tick. Nothing outside the
//! tick loop mutates scheduler state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::error::PresentationError;
use crate::timer::PromptId;

/// How long a fullscreen message stays up before it dismisses itself.
pub const FULLSCREEN_MESSAGE_SECS: u64 = 10;

/// The small always-on-top Pomodoro countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    /// Counting down a WORK phase.
    Work,
    /// Counting down a "remind me later" deferral.
    Deferral,
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayKind::Work => f.write_str("work"),
            OverlayKind::Deferral => f.write_str("deferral"),
        }
    }
}

/// Icon shown with a message, resolved by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconRef {
    Work,
    Break,
    Water,
    Meal,
}

impl IconRef {
    pub fn file_name(self) -> &'static str {
        match self {
            IconRef::Work => "work_icon.png",
            IconRef::Break => "break_icon.png",
            IconRef::Water => "water_icon.png",
            IconRef::Meal => "meal_icon.png",
        }
    }

    pub fn resolve(self, assets_dir: &Path) -> PathBuf {
        assets_dir.join(self.file_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullscreenMessage {
    pub title: String,
    pub body: String,
    pub icon: IconRef,
}

impl FullscreenMessage {
    pub fn work_time(work_minutes: u32) -> Self {
        Self {
            title: "Work Time".into(),
            body: format!("Time to work for {work_minutes} mins!"),
            icon: IconRef::Work,
        }
    }

    pub fn water() -> Self {
        Self {
            title: "Water Reminder".into(),
            body: "Time to drink some water!".into(),
            icon: IconRef::Water,
        }
    }

    pub fn meal(timing: &str) -> Self {
        Self {
            title: "Meal Time".into(),
            body: format!("It's {timing}! Time for your scheduled meal."),
            icon: IconRef::Meal,
        }
    }
}

/// Requests the scheduling core makes of the presentation layer.
///
/// Implementations must not block: open the window and return.
pub trait PresentationGateway {
    fn show_overlay(&mut self, kind: OverlayKind, text: &str) -> Result<(), PresentationError>;

    fn update_overlay_text(&mut self, kind: OverlayKind, text: &str)
        -> Result<(), PresentationError>;

    fn hide_overlay(&mut self, kind: OverlayKind) -> Result<(), PresentationError>;

    /// Fire-and-forget; dismissed on click, escape, or after
    /// [`FULLSCREEN_MESSAGE_SECS`].
    fn show_fullscreen_message(&mut self, message: &FullscreenMessage)
        -> Result<(), PresentationError>;

    /// Modal offering exactly "start break" and "remind later". Each answer
    /// must be sent back as the matching [`UserCommand`] for `prompt`. The
    /// modal stays open until [`close_break_confirmation`] is requested.
    ///
    /// [`close_break_confirmation`]: PresentationGateway::close_break_confirmation
    fn show_break_confirmation(&mut self, prompt: PromptId) -> Result<(), PresentationError>;

    fn close_break_confirmation(&mut self) -> Result<(), PresentationError>;

    /// Fullscreen break countdown with a cancel button answering `prompt`.
    /// Like the confirmation, it stays open until the core closes it.
    fn show_break_overlay(&mut self, prompt: PromptId) -> Result<(), PresentationError>;

    fn update_break_overlay_text(&mut self, text: &str) -> Result<(), PresentationError>;

    fn close_break_overlay(&mut self) -> Result<(), PresentationError>;

    /// Audible cue played before fullscreen messages.
    fn play_chime(&mut self) -> Result<(), PresentationError> {
        Ok(())
    }

    /// Release every open surface; called once on shutdown.
    fn close_all(&mut self) -> Result<(), PresentationError>;
}

/// Answers and requests delivered back into the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum UserCommand {
    StartBreak { prompt: PromptId },
    RemindLater { prompt: PromptId },
    CancelBreak { prompt: PromptId },
    Quit,
}

/// Cloneable, `Send` handle for queuing [`UserCommand`]s from any thread.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<UserCommand>,
}

impl CommandSender {
    pub(crate) fn new(tx: mpsc::Sender<UserCommand>) -> Self {
        Self { tx }
    }

    /// Queue `command` for the next tick. Returns `false` once the scheduler
    /// has gone away.
    pub fn send(&self, command: UserCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Format a countdown as `MM:SS`.
pub fn format_countdown(remaining_secs: i64) -> String {
    let secs = remaining_secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
