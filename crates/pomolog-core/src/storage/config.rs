//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Session durations and the long-break interval
//! - Confirmation and auto-advance policy
//! - Log destination and formatting options
//! - Notification preferences
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::check_minutes;

/// Session lengths, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationsConfig {
    #[serde(default = "default_pomo_minutes")]
    pub pomo_minutes: f64,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: f64,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: f64,
    /// Every n-th completed pomodoro is followed by a long break.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default = "default_custom_pomo")]
    pub custom_pomo_minutes: f64,
    #[serde(default = "default_custom_break")]
    pub custom_break_minutes: f64,
}

/// Confirmation and auto-advance policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub confirm_on_session_start: bool,
    #[serde(default)]
    pub confirm_on_session_end: bool,
    /// Keep running in overtime at the end of a session until the user
    /// explicitly finishes it.
    #[serde(default)]
    pub manual_advance: bool,
    #[serde(default = "default_true")]
    pub auto_start_next: bool,
    /// With `auto_start_next` off, pause the upcoming session once this
    /// many cycles ran unattended.
    #[serde(default)]
    pub auto_stop_after_cycles: u32,
}

/// Where session entries are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDestination {
    /// `logging.log_file`; entries are prepended, no daily headings.
    FixedFile,
    /// Today's daily note as resolved by the note resolver.
    ActiveDailyNote,
    /// `logging.log_note`, with daily sections.
    #[default]
    CustomNote,
}

/// Session log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub destination: LogDestination,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_note")]
    pub log_note: String,
    /// Separate file for unsuccessful pomodoros. Falls back to the
    /// regular destination when unset.
    #[serde(default)]
    pub unsuccessful_log_file: Option<String>,
    #[serde(default)]
    pub include_active_note_link: bool,
    /// Root directory that log paths are relative to. Defaults to the
    /// data directory.
    #[serde(default)]
    pub vault_dir: Option<PathBuf>,
    #[serde(default)]
    pub daily_note_folder: String,
    /// chrono format string for daily note file names.
    #[serde(default = "default_daily_note_format")]
    pub daily_note_format: String,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub use_emoji: bool,
    #[serde(default = "default_true")]
    pub play_sound_on_end: bool,
    #[serde(default)]
    pub show_system_notification_on_end: bool,
    #[serde(default)]
    pub white_noise: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub durations: DurationsConfig,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_pomo_minutes() -> f64 {
    25.0
}
fn default_short_break() -> f64 {
    5.0
}
fn default_long_break() -> f64 {
    15.0
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_custom_pomo() -> f64 {
    50.0
}
fn default_custom_break() -> f64 {
    10.0
}
fn default_true() -> bool {
    true
}
fn default_log_file() -> String {
    "Pomodoro Log.md".into()
}
fn default_log_note() -> String {
    "Pomodoro.md".into()
}
fn default_daily_note_format() -> String {
    "%Y-%m-%d".into()
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            pomo_minutes: default_pomo_minutes(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            long_break_interval: default_long_break_interval(),
            custom_pomo_minutes: default_custom_pomo(),
            custom_break_minutes: default_custom_break(),
        }
    }
}

impl DurationsConfig {
    /// Reject lengths a session cannot run for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lengths = [
            ("durations.pomo_minutes", self.pomo_minutes),
            ("durations.short_break_minutes", self.short_break_minutes),
            ("durations.long_break_minutes", self.long_break_minutes),
            ("durations.custom_pomo_minutes", self.custom_pomo_minutes),
            ("durations.custom_break_minutes", self.custom_break_minutes),
        ];
        for (key, minutes) in lengths {
            check_minutes(minutes).map_err(|message| ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })?;
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            destination: LogDestination::default(),
            log_file: default_log_file(),
            log_note: default_log_note(),
            unsuccessful_log_file: None,
            include_active_note_link: false,
            vault_dir: None,
            daily_note_folder: String::new(),
            daily_note_format: default_daily_note_format(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            use_emoji: true,
            play_sound_on_end: true,
            show_system_notification_on_end: false,
            white_noise: false,
        }
    }
}

impl Config {
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
        if parts.peek().map_or(true, |p| p.is_empty()) {
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
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
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

    /// Path of the config file inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed
    /// or holds an out-of-range session length, or if the default config
    /// cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing the defaults there when the
    /// file does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.durations.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by key. Does not persist; call [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not fit
    /// the field's type, or a session length falls outside its bounds.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.durations.validate()?;
        *self = updated;
        Ok(())
    }

    /// Directory that log paths are resolved against.
    pub fn vault_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.logging.vault_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }
}
