//! Shared fixtures for scheduler integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration as StdDuration, SystemTime};

use chrono::{DateTime, Duration, TimeZone, Utc};
use restcue_core::{
    ConfigStore, Event, FullscreenMessage, ManualClock, OverlayKind, PresentationError,
    PresentationGateway, PromptId, ReminderScheduler, SchedulerContext,
};
use tempfile::TempDir;

/// One request received from the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ShowOverlay(OverlayKind, String),
    UpdateOverlay(OverlayKind, String),
    HideOverlay(OverlayKind),
    Fullscreen(FullscreenMessage),
    BreakConfirmation(PromptId),
    CloseBreakConfirmation,
    BreakOverlay(PromptId),
    BreakOverlayText(String),
    CloseBreakOverlay,
    Chime,
    CloseAll,
}

/// Gateway that records every request instead of drawing anything.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    pub calls: Vec<Call>,
    pub fail_fullscreen: bool,
}

impl RecordingGateway {
    pub fn take(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    fn record(&mut self, call: Call) -> Result<(), PresentationError> {
        self.calls.push(call);
        Ok(())
    }
}

impl PresentationGateway for RecordingGateway {
    fn show_overlay(&mut self, kind: OverlayKind, text: &str) -> Result<(), PresentationError> {
        self.record(Call::ShowOverlay(kind, text.to_string()))
    }

    fn update_overlay_text(
        &mut self,
        kind: OverlayKind,
        text: &str,
    ) -> Result<(), PresentationError> {
        self.record(Call::UpdateOverlay(kind, text.to_string()))
    }

    fn hide_overlay(&mut self, kind: OverlayKind) -> Result<(), PresentationError> {
        self.record(Call::HideOverlay(kind))
    }

    fn show_fullscreen_message(
        &mut self,
        message: &FullscreenMessage,
    ) -> Result<(), PresentationError> {
        self.calls.push(Call::Fullscreen(message.clone()));
        if self.fail_fullscreen {
            return Err(PresentationError::RenderFailed {
                surface: "fullscreen".into(),
                message: "no display".into(),
            });
        }
        Ok(())
    }

    fn show_break_confirmation(&mut self, prompt: PromptId) -> Result<(), PresentationError> {
        self.record(Call::BreakConfirmation(prompt))
    }

    fn close_break_confirmation(&mut self) -> Result<(), PresentationError> {
        self.record(Call::CloseBreakConfirmation)
    }

    fn show_break_overlay(&mut self, prompt: PromptId) -> Result<(), PresentationError> {
        self.record(Call::BreakOverlay(prompt))
    }

    fn update_break_overlay_text(&mut self, text: &str) -> Result<(), PresentationError> {
        self.record(Call::BreakOverlayText(text.to_string()))
    }

    fn close_break_overlay(&mut self) -> Result<(), PresentationError> {
        self.record(Call::CloseBreakOverlay)
    }

    fn play_chime(&mut self) -> Result<(), PresentationError> {
        self.record(Call::Chime)
    }

    fn close_all(&mut self) -> Result<(), PresentationError> {
        self.record(Call::CloseAll)
    }
}

/// 2024-03-01 09:00:00 UTC; the manual clock's local time is UTC as well.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Rewrite the config and push its modification time forward so the store
/// notices regardless of filesystem timestamp resolution.
pub fn rewrite_config(path: &Path, content: &str) {
    let previous = fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);
    fs::write(path, content).unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(previous + StdDuration::from_secs(5)).unwrap();
}

pub struct Harness {
    pub clock: ManualClock,
    pub scheduler: ReminderScheduler<RecordingGateway>,
    pub path: PathBuf,
    _dir: TempDir,
}

impl Harness {
    /// Scheduler over a config file holding `toml`, started at [`start`].
    pub fn new(toml: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, toml).unwrap();

        let clock = ManualClock::new(start());
        let ctx = SchedulerContext::new(ConfigStore::open(&path), Box::new(clock.clone()));
        let scheduler = ReminderScheduler::new(ctx, RecordingGateway::default());
        Self {
            clock,
            scheduler,
            path,
            _dir: dir,
        }
    }

    pub fn tick(&mut self) -> Vec<Event> {
        self.scheduler.tick()
    }

    pub fn advance_and_tick(&mut self, secs: i64) -> Vec<Event> {
        self.clock.advance(Duration::seconds(secs));
        self.scheduler.tick()
    }

    pub fn calls(&mut self) -> Vec<Call> {
        self.scheduler.gateway_mut().take()
    }

    pub fn rewrite(&self, toml: &str) {
        rewrite_config(&self.path, toml);
    }
}

pub fn phase_changes(events: &[Event]) -> Vec<(restcue_core::Phase, restcue_core::Phase)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PhaseChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}
