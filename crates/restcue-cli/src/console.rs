//! Console stand-in for the window layer.
//!
//! Overlays and messages are written to stdout; the user answers prompts by
//! typing `start`, `later`, `cancel` or `quit` on stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use restcue_core::gateway::FULLSCREEN_MESSAGE_SECS;
use restcue_core::{
    CommandSender, FullscreenMessage, OverlayKind, PresentationError, PresentationGateway,
    PromptId, UserCommand,
};
use tracing::{debug, warn};

/// Prompts currently on screen, shared with the stdin reader.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpenPrompts {
    pub confirmation: Option<PromptId>,
    pub break_overlay: Option<PromptId>,
}

pub type SharedPrompts = Arc<Mutex<OpenPrompts>>;

fn lock(prompts: &SharedPrompts) -> std::sync::MutexGuard<'_, OpenPrompts> {
    prompts.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ConsoleGateway {
    assets: PathBuf,
    prompts: SharedPrompts,
}

impl ConsoleGateway {
    pub fn new(assets: PathBuf, prompts: SharedPrompts) -> Self {
        Self { assets, prompts }
    }

    fn emit(&self, surface: &str, line: &str) -> Result<(), PresentationError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| PresentationError::RenderFailed {
                surface: surface.to_string(),
                message: e.to_string(),
            })
    }
}

impl PresentationGateway for ConsoleGateway {
    fn show_overlay(&mut self, kind: OverlayKind, text: &str) -> Result<(), PresentationError> {
        self.emit("overlay", &format!("[{kind}] {text}"))
    }

    fn update_overlay_text(
        &mut self,
        kind: OverlayKind,
        text: &str,
    ) -> Result<(), PresentationError> {
        // One line per minute is plenty on a terminal.
        if text.ends_with(":00") {
            self.emit("overlay", &format!("[{kind}] {text}"))?;
        }
        Ok(())
    }

    fn hide_overlay(&mut self, kind: OverlayKind) -> Result<(), PresentationError> {
        debug!(%kind, "Countdown overlay hidden");
        Ok(())
    }

    fn show_fullscreen_message(
        &mut self,
        message: &FullscreenMessage,
    ) -> Result<(), PresentationError> {
        let icon = message.icon.resolve(&self.assets);
        if !icon.exists() {
            warn!(icon = %icon.display(), "Icon not found, showing message without it");
        }
        self.emit(
            "fullscreen message",
            &format!(
                "\n=== {} ===\n{}\n(dismisses after {FULLSCREEN_MESSAGE_SECS}s)\n",
                message.title, message.body
            ),
        )
    }

    fn show_break_confirmation(&mut self, prompt: PromptId) -> Result<(), PresentationError> {
        lock(&self.prompts).confirmation = Some(prompt);
        self.emit(
            "break confirmation",
            "Time for a break! Type `start` to begin it or `later` to be reminded in 5 minutes.",
        )
    }

    fn close_break_confirmation(&mut self) -> Result<(), PresentationError> {
        lock(&self.prompts).confirmation = None;
        Ok(())
    }

    fn show_break_overlay(&mut self, prompt: PromptId) -> Result<(), PresentationError> {
        lock(&self.prompts).break_overlay = Some(prompt);
        self.emit("break overlay", "On break. Type `cancel` to get back to work early.")
    }

    fn update_break_overlay_text(&mut self, text: &str) -> Result<(), PresentationError> {
        if text.ends_with(":00") {
            self.emit("break overlay", &format!("[break] {text}"))?;
        }
        Ok(())
    }

    fn close_break_overlay(&mut self) -> Result<(), PresentationError> {
        lock(&self.prompts).break_overlay = None;
        Ok(())
    }

    fn play_chime(&mut self) -> Result<(), PresentationError> {
        self.emit("chime", "\x07")
    }

    fn close_all(&mut self) -> Result<(), PresentationError> {
        *lock(&self.prompts) = OpenPrompts::default();
        self.emit("all surfaces", "restcue stopped")
    }
}

/// Map one stdin line to a command for the prompt it answers.
///
/// Prompts stay open until the scheduler closes them, so an answer the
/// scheduler rejects can simply be typed again.
pub fn parse_answer(input: &str, open: &OpenPrompts) -> Result<UserCommand, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "start" => open
            .confirmation
            .map(|prompt| UserCommand::StartBreak { prompt })
            .ok_or_else(|| "no break confirmation is open".to_string()),
        "later" => open
            .confirmation
            .map(|prompt| UserCommand::RemindLater { prompt })
            .ok_or_else(|| "no break confirmation is open".to_string()),
        "cancel" => open
            .break_overlay
            .map(|prompt| UserCommand::CancelBreak { prompt })
            .ok_or_else(|| "no break is running".to_string()),
        "quit" | "q" => Ok(UserCommand::Quit),
        other => Err(format!(
            "unknown input '{other}' (expected start, later, cancel or quit)"
        )),
    }
}

/// Forward stdin answers to the scheduler until EOF or until it goes away.
pub fn spawn_input_reader(sender: CommandSender, prompts: SharedPrompts) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            let open = *lock(&prompts);
            let answer = parse_answer(&line, &open);
            match answer {
                Ok(command) => {
                    if !sender.send(command) {
                        break;
                    }
                }
                Err(message) => eprintln!("{message}"),
            }
        }
        debug!("stdin closed");
    });
}
