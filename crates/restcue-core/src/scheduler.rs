//! Cooperative reminder loop.
//!
//! One thread owns every piece of reminder state. Each tick it:
//!
//! 1. reloads the config if the file changed and takes one snapshot for the
//!    rest of the tick,
//! 2. applies queued [`UserCommand`]s,
//! 3. refreshes the Pomodoro countdown and drives the state machine (or hides
//!    the Pomodoro surfaces when the category is disabled),
//! 4. polls the water timer,
//! 5. polls the meal timer.
//!
//! A failing step is logged and recorded as [`Event::StepFailed`]; the
//! remaining steps still run and the loop carries on with the next tick.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::error::{PresentationError, Result};
use crate::events::{Event, TickStep};
use crate::gateway::{
    format_countdown, CommandSender, FullscreenMessage, OverlayKind, PresentationGateway,
    UserCommand,
};
use crate::storage::{Config, ConfigStore, PomodoroConfig};
use crate::timer::{
    IntervalTimer, MealTimer, Phase, PomodoroStateMachine, PomodoroStatus, PromptId, Transition,
    TransitionCause,
};

/// Target loop period.
pub const TICK_PERIOD_MS: u64 = 100;

/// Decides how long the loop waits between ticks.
pub trait TickPacer {
    fn pace(&mut self);
}

/// Sleeps a fixed period between ticks.
#[derive(Debug, Clone, Copy)]
pub struct FixedSleepPacer {
    period: std::time::Duration,
}

impl FixedSleepPacer {
    pub fn new(period: std::time::Duration) -> Self {
        Self { period }
    }
}

impl Default for FixedSleepPacer {
    fn default() -> Self {
        Self::new(std::time::Duration::from_millis(TICK_PERIOD_MS))
    }
}

impl TickPacer for FixedSleepPacer {
    fn pace(&mut self) {
        std::thread::sleep(self.period);
    }
}

/// Shared stop flag. Other threads only flip it; the loop checks it at the
/// top of every tick.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything the tick mutates, passed around explicitly.
pub struct SchedulerContext {
    pub store: ConfigStore,
    pub pomodoro: PomodoroStateMachine,
    pub water: IntervalTimer,
    pub meals: MealTimer,
    pub clock: Box<dyn Clock>,
}

impl SchedulerContext {
    /// Fresh state at the clock's current instant: WORK with zero elapsed,
    /// water baseline at now.
    pub fn new(store: ConfigStore, clock: Box<dyn Clock>) -> Self {
        let now = clock.now();
        let work = pomodoro_settings(store.config())
            .work_duration()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Invalid work length at startup, using default");
                Duration::minutes(i64::from(PomodoroConfig::default().work_minutes))
            });
        Self {
            store,
            pomodoro: PomodoroStateMachine::new(now, work),
            water: IntervalTimer::new(now),
            meals: MealTimer::new(),
            clock,
        }
    }
}

/// Pomodoro settings used for commands: the section even when disabled,
/// defaults when absent.
fn pomodoro_settings(config: &Config) -> PomodoroConfig {
    config.pomodoro.clone().unwrap_or_default()
}

fn present(surface: &str, result: Result<(), PresentationError>) {
    if let Err(e) = result {
        warn!(surface, error = %e, "Presentation request failed");
    }
}

fn phase_changed(t: &Transition, at: DateTime<Utc>) -> Event {
    Event::PhaseChanged {
        from: t.from,
        to: t.to,
        cause: t.cause,
        duration_secs: t.duration.num_seconds(),
        prompt: t.prompt,
        at,
    }
}

/// What the core believes is currently on screen.
#[derive(Debug, Default)]
struct DisplayState {
    countdown: Option<(OverlayKind, String)>,
    /// Confirmation prompt currently open.
    confirmation: Option<PromptId>,
    /// Last text shown on the break overlay; `Some` while it is open.
    break_overlay: Option<String>,
}

/// Remembers the last failure per step so a persistent error is logged once
/// rather than ten times a second.
#[derive(Debug, Default)]
struct StepFailures {
    last: HashMap<TickStep, String>,
}

impl StepFailures {
    fn record(
        &mut self,
        step: TickStep,
        result: Result<()>,
        at: DateTime<Utc>,
        events: &mut Vec<Event>,
    ) {
        match result {
            Ok(()) => {
                if let Some(previous) = self.last.remove(&step) {
                    info!(?step, %previous, "Tick step recovered");
                }
            }
            Err(e) => {
                let message = e.to_string();
                if self.last.get(&step) == Some(&message) {
                    debug!(?step, error = %message, "Tick step still failing");
                } else {
                    error!(?step, error = %message, "Tick step failed");
                }
                self.last.insert(step, message.clone());
                events.push(Event::StepFailed { step, message, at });
            }
        }
    }
}

pub struct ReminderScheduler<G: PresentationGateway> {
    ctx: SchedulerContext,
    gateway: G,
    inbox: mpsc::Receiver<UserCommand>,
    sender: CommandSender,
    shutdown: ShutdownHandle,
    display: DisplayState,
    failures: StepFailures,
    water_armed: bool,
}

impl<G: PresentationGateway> ReminderScheduler<G> {
    pub fn new(ctx: SchedulerContext, gateway: G) -> Self {
        let (tx, inbox) = mpsc::channel();
        Self {
            ctx,
            gateway,
            inbox,
            sender: CommandSender::new(tx),
            shutdown: ShutdownHandle::new(),
            display: DisplayState::default(),
            failures: StepFailures::default(),
            water_armed: true,
        }
    }

    /// Handle for delivering user answers from the presentation layer.
    pub fn command_sender(&self) -> CommandSender {
        self.sender.clone()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn status(&self) -> PomodoroStatus {
        self.ctx.pomodoro.status(self.ctx.clock.now())
    }

    /// Run until shutdown is requested, then close every open surface.
    pub fn run(&mut self, pacer: &mut dyn TickPacer) {
        info!(period_ms = TICK_PERIOD_MS, "Reminder loop started");
        while !self.shutdown.is_requested() {
            match panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
                Ok(events) => {
                    for event in &events {
                        debug!(?event, "Tick event");
                    }
                }
                Err(_) => error!("Tick panicked, continuing with the next tick"),
            }
            if self.shutdown.is_requested() {
                break;
            }
            pacer.pace();
        }
        self.display = DisplayState::default();
        present("all surfaces", self.gateway.close_all());
        info!("Reminder loop stopped");
    }

    /// One iteration of the loop.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.ctx.clock.now();
        let mut events = Vec::new();

        if self.ctx.store.reload_if_changed() {
            events.push(Event::ConfigReloaded { at: now });
        }
        let config = self.ctx.store.snapshot();

        let result = self.apply_commands(now, &config, &mut events);
        self.failures.record(TickStep::Commands, result, now, &mut events);

        let result = match config.active_pomodoro() {
            Some(pomodoro) => self.pomodoro_step(now, pomodoro, &mut events),
            None => {
                self.hide_pomodoro_surfaces();
                Ok(())
            }
        };
        self.failures.record(TickStep::Pomodoro, result, now, &mut events);

        let result = self.water_step(now, &config, &mut events);
        self.failures.record(TickStep::Water, result, now, &mut events);

        let result = self.meal_step(now, &config, &mut events);
        self.failures.record(TickStep::Meals, result, now, &mut events);

        events
    }

    // ── Commands ─────────────────────────────────────────────────────

    fn apply_commands(
        &mut self,
        now: DateTime<Utc>,
        config: &Config,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let settings = pomodoro_settings(config);
        let display = config.active_pomodoro().is_some();
        let mut first_error = None;
        while let Ok(command) = self.inbox.try_recv() {
            let quit = command == UserCommand::Quit;
            if let Err(e) = self.apply_command(command, now, &settings, display, events) {
                first_error.get_or_insert(e);
            }
            if quit {
                // Anything queued behind a quit is dropped.
                break;
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn apply_command(
        &mut self,
        command: UserCommand,
        now: DateTime<Utc>,
        settings: &PomodoroConfig,
        display: bool,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        debug!(?command, "Applying user command");
        // A rejected answer leaves its prompt outstanding and its surface
        // open, so the user can answer again once the config is fixed.
        let transition = match command {
            UserCommand::StartBreak { prompt } => {
                self.ctx.pomodoro.start_break(now, settings, prompt)?
            }
            UserCommand::RemindLater { prompt } => self.ctx.pomodoro.remind_later(now, prompt),
            UserCommand::CancelBreak { prompt } => {
                self.ctx.pomodoro.cancel_break(now, settings, prompt)?
            }
            UserCommand::Quit => {
                info!("Shutdown requested");
                self.shutdown.request();
                events.push(Event::ShutdownRequested { at: now });
                return Ok(());
            }
        };

        if let Some(t) = transition {
            self.present_transition(&t, settings, display);
            events.push(phase_changed(&t, now));
        }
        Ok(())
    }

    // ── Pomodoro ─────────────────────────────────────────────────────

    fn pomodoro_step(
        &mut self,
        now: DateTime<Utc>,
        pomodoro: &PomodoroConfig,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let text = format_countdown(self.ctx.pomodoro.remaining(now).num_seconds());
        self.refresh_pomodoro_display(&text);

        if let Some(t) = self.ctx.pomodoro.tick(now, pomodoro)? {
            self.present_transition(&t, pomodoro, true);
            events.push(phase_changed(&t, now));
        }
        Ok(())
    }

    fn refresh_pomodoro_display(&mut self, text: &str) {
        match self.ctx.pomodoro.phase() {
            Phase::Work => self.show_countdown(OverlayKind::Work, text),
            Phase::RemindLater => self.show_countdown(OverlayKind::Deferral, text),
            Phase::BreakPending => {
                self.hide_countdown();
                if self.display.confirmation.is_none() {
                    if let Some(prompt) = self.ctx.pomodoro.outstanding_prompt() {
                        self.open_confirmation(prompt);
                    }
                }
            }
            Phase::Break => {
                self.hide_countdown();
                if self.display.break_overlay.is_some() {
                    self.update_break_overlay(text);
                } else if let Some(prompt) = self.ctx.pomodoro.outstanding_prompt() {
                    self.open_break_overlay(prompt, text);
                }
            }
        }
    }

    fn present_transition(&mut self, t: &Transition, settings: &PomodoroConfig, display: bool) {
        if t.from == Phase::BreakPending {
            self.close_confirmation();
        }
        match (t.to, t.cause) {
            (Phase::BreakPending, _) => {
                self.hide_countdown();
                if let Some(prompt) = t.prompt {
                    self.open_confirmation(prompt);
                }
            }
            (Phase::Break, _) => {
                self.hide_countdown();
                if let (true, Some(prompt)) = (display, t.prompt) {
                    self.open_break_overlay(prompt, &format_countdown(t.duration.num_seconds()));
                }
            }
            (Phase::RemindLater, _) => {}
            (Phase::Work, TransitionCause::Elapsed) => {
                self.close_break_overlay();
                self.announce(&FullscreenMessage::work_time(settings.work_minutes));
            }
            (Phase::Work, _) => self.close_break_overlay(),
        }
    }

    fn hide_pomodoro_surfaces(&mut self) {
        self.hide_countdown();
        self.close_confirmation();
        self.close_break_overlay();
    }

    fn show_countdown(&mut self, kind: OverlayKind, text: &str) {
        let shown = self.display.countdown.as_ref().map(|(k, t)| (*k, t.as_str() != text));
        match shown {
            Some((k, changed)) if k == kind => {
                if changed {
                    present("countdown", self.gateway.update_overlay_text(kind, text));
                    self.display.countdown = Some((kind, text.to_string()));
                }
            }
            _ => {
                self.hide_countdown();
                present("countdown", self.gateway.show_overlay(kind, text));
                self.display.countdown = Some((kind, text.to_string()));
            }
        }
    }

    fn hide_countdown(&mut self) {
        if let Some((kind, _)) = self.display.countdown.take() {
            present("countdown", self.gateway.hide_overlay(kind));
        }
    }

    fn open_confirmation(&mut self, prompt: PromptId) {
        present("break confirmation", self.gateway.show_break_confirmation(prompt));
        self.display.confirmation = Some(prompt);
    }

    fn close_confirmation(&mut self) {
        if self.display.confirmation.take().is_some() {
            present("break confirmation", self.gateway.close_break_confirmation());
        }
    }

    fn open_break_overlay(&mut self, prompt: PromptId, text: &str) {
        present("break overlay", self.gateway.show_break_overlay(prompt));
        present("break overlay", self.gateway.update_break_overlay_text(text));
        self.display.break_overlay = Some(text.to_string());
    }

    fn update_break_overlay(&mut self, text: &str) {
        if self.display.break_overlay.as_deref() != Some(text) {
            present("break overlay", self.gateway.update_break_overlay_text(text));
            self.display.break_overlay = Some(text.to_string());
        }
    }

    fn close_break_overlay(&mut self) {
        if self.display.break_overlay.take().is_some() {
            present("break overlay", self.gateway.close_break_overlay());
        }
    }

    // ── Interval reminders ───────────────────────────────────────────

    fn water_step(
        &mut self,
        now: DateTime<Utc>,
        config: &Config,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let Some(water) = config.active_water() else {
            self.water_armed = false;
            return Ok(());
        };
        if !self.water_armed {
            // Re-enabled: count a fresh interval from now.
            self.ctx.water.restart(now);
            self.water_armed = true;
        }

        let interval = water.interval()?;
        if self.ctx.water.poll(now, interval) {
            info!(interval_minutes = water.interval_minutes, "Water reminder");
            self.announce(&FullscreenMessage::water());
            events.push(Event::WaterReminder { at: now });
        }
        Ok(())
    }

    fn meal_step(
        &mut self,
        now: DateTime<Utc>,
        config: &Config,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let Some(meals) = config.active_meals() else {
            return Ok(());
        };
        let minute = self.ctx.clock.local_time().format("%H:%M").to_string();
        if self.ctx.meals.poll(&minute, &meals.valid_timings()) {
            info!(timing = %minute, "Meal reminder");
            self.announce(&FullscreenMessage::meal(&minute));
            events.push(Event::MealReminder {
                timing: minute,
                at: now,
            });
        }
        Ok(())
    }

    /// Chime plus fullscreen message. Failures are logged; the reminder
    /// still counts as fired.
    fn announce(&mut self, message: &FullscreenMessage) {
        present("chime", self.gateway.play_chime());
        present("fullscreen message", self.gateway.show_fullscreen_message(message));
    }
}
