//! TOML-based reminder configuration.
//!
//! Every reminder category lives in its own optional table:
//! - `[pomodoro]` work/break cycle lengths
//! - `[water]` hydration interval
//! - `[meals]` fixed wall-clock meal timings
//!
//! A missing table disables the category. The document is human-editable and
//! hot-reloaded by [`ConfigStore`] whenever its modification time advances.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

/// Pomodoro cycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

/// Hydration reminder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_water_interval")]
    pub interval_minutes: u32,
}

/// Meal reminder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Wall-clock minutes in `HH:MM` form.
    #[serde(default)]
    pub timings: BTreeSet<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/restcue/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Launch at login. Registration itself is handled outside the core.
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pomodoro: Option<PomodoroConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<WaterConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meals: Option<MealsConfig>,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_water_interval() -> u32 {
    60
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: default_water_interval(),
        }
    }
}

impl Default for MealsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timings: BTreeSet::new(),
        }
    }
}

fn positive_minutes(key: &str, minutes: u32) -> Result<Duration, ConfigError> {
    if minutes == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "duration must be greater than zero".to_string(),
        });
    }
    Ok(Duration::minutes(i64::from(minutes)))
}

impl PomodoroConfig {
    /// Length of a WORK phase.
    pub fn work_duration(&self) -> Result<Duration, ConfigError> {
        positive_minutes("pomodoro.work_minutes", self.work_minutes)
    }

    /// Length of a BREAK phase.
    pub fn break_duration(&self) -> Result<Duration, ConfigError> {
        positive_minutes("pomodoro.break_minutes", self.break_minutes)
    }
}

impl WaterConfig {
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        positive_minutes("water.interval_minutes", self.interval_minutes)
    }
}

impl MealsConfig {
    fn parse_timing(raw: &str) -> Option<String> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .ok()
            .map(|time| time.format("%H:%M").to_string())
    }

    /// Configured timings normalised to `HH:MM`; unparseable entries are
    /// skipped.
    pub fn valid_timings(&self) -> BTreeSet<String> {
        self.timings
            .iter()
            .filter_map(|raw| Self::parse_timing(raw))
            .collect()
    }

    /// Entries that are not valid `HH:MM` minutes.
    pub fn invalid_timings(&self) -> Vec<&str> {
        self.timings
            .iter()
            .filter(|raw| Self::parse_timing(raw).is_none())
            .map(String::as_str)
            .collect()
    }
}

impl Config {
    /// A fully populated config, written by `config reset`.
    pub fn sample() -> Self {
        Self {
            auto_start: false,
            pomodoro: Some(PomodoroConfig::default()),
            water: Some(WaterConfig::default()),
            meals: Some(MealsConfig {
                enabled: true,
                timings: ["08:00", "13:00", "19:00"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }),
        }
    }

    /// Pomodoro settings, only when the section exists and is enabled.
    pub fn active_pomodoro(&self) -> Option<&PomodoroConfig> {
        self.pomodoro.as_ref().filter(|p| p.enabled)
    }

    /// Water settings, only when the section exists and is enabled.
    pub fn active_water(&self) -> Option<&WaterConfig> {
        self.water.as_ref().filter(|w| w.enabled)
    }

    /// Meal settings, only when the section exists and is enabled.
    pub fn active_meals(&self) -> Option<&MealsConfig> {
        self.meals.as_ref().filter(|m| m.enabled)
    }

    /// Check the positive-duration invariant for every present section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(p) = &self.pomodoro {
            p.work_duration()?;
            p.break_duration()?;
        }
        if let Some(w) = &self.water {
            w.interval()?;
        }
        Ok(())
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u32>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Make sure the section a key points into exists, so that
    /// `pomodoro.enabled` can be set on a config without a `[pomodoro]` table.
    fn materialize_section(&mut self, key: &str) {
        match key.split('.').next() {
            Some("pomodoro") => {
                self.pomodoro.get_or_insert_with(PomodoroConfig::default);
            }
            Some("water") => {
                self.water.get_or_insert_with(WaterConfig::default);
            }
            Some("meals") => {
                self.meals.get_or_insert_with(MealsConfig::default);
            }
            _ => {}
        }
    }

    /// Default on-disk location.
    pub fn path() -> Result<PathBuf, ConfigError> {
        super::default_config_path()
    }

    /// Load from `path`.
    ///
    /// A missing file yields the empty config (every category disabled). An
    /// unreadable or malformed file is logged and also yields the empty
    /// config; this never fails.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(cfg) => {
                    for timing in cfg.meals.iter().flat_map(|m| m.invalid_timings()) {
                        warn!(path = %path.display(), timing = %timing, "Ignoring invalid meal timing");
                    }
                    cfg
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Malformed config, reminders disabled until fixed");
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using empty config");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read config, reminders disabled");
                Self::default()
            }
        }
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The config is left untouched on error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result would break the positive-duration invariant.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut candidate = self.clone();
        candidate.materialize_section(key);

        let mut json = serde_json::to_value(&candidate).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;

        *self = updated;
        Ok(())
    }
}

/// Owns the live config and detects external edits through the file's
/// modification time.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
    last_modified: Option<SystemTime>,
}

fn modified_at(path: &Path) -> std::io::Result<Option<SystemTime>> {
    match std::fs::metadata(path) {
        Ok(meta) => meta.modified().map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

impl ConfigStore {
    /// Load the document at `path` and remember its modification marker.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_modified = modified_at(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Cannot stat config file");
            None
        });
        let config = Config::load_from(&path);
        info!(path = %path.display(), "Config loaded");
        Self {
            path,
            config,
            last_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A consistent copy for the remainder of one tick.
    pub fn snapshot(&self) -> Config {
        self.config.clone()
    }

    /// Reload when the file's modification marker has moved.
    ///
    /// Returns `true` when the in-memory config was replaced. A stat failure
    /// is logged and treated as "unchanged".
    pub fn reload_if_changed(&mut self) -> bool {
        let current = match modified_at(&self.path) {
            Ok(current) => current,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot stat config file, keeping current config");
                return false;
            }
        };

        let changed = match (self.last_modified, current) {
            (Some(previous), Some(now)) => now > previous,
            (None, Some(_)) | (Some(_), None) => true,
            (None, None) => false,
        };
        if !changed {
            return false;
        }

        info!(path = %self.path.display(), "Config change detected, reloading");
        self.config = Config::load_from(&self.path);
        self.last_modified = current;
        true
    }

    /// Replace the in-memory config and persist it.
    ///
    /// The modification marker is refreshed so the store does not reload its
    /// own write on the next tick.
    pub fn save(&mut self, config: Config) -> Result<(), ConfigError> {
        config.save_to(&self.path)?;
        self.config = config;
        self.last_modified = modified_at(&self.path).ok().flatten();
        Ok(())
    }
}
