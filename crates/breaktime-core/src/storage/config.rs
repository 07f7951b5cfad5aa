//! TOML-based application configuration.
//!
//! Stores the reminder cadences and related preferences:
//! - Break intervals and durations
//! - Water and eye-exercise intervals
//! - Working-hours window
//! - Break presentation mode (consumed by the display layer)
//!
//! Configuration is stored at `~/.config/breaktime/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, ValidationError};
use crate::timer::EventKind;

/// How break popups are presented. The scheduler ignores this; display
/// collaborators read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakMode {
    /// Small always-on-top window.
    #[default]
    Moderate,
    /// Fullscreen window that cannot be dismissed early.
    Aggressive,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breaktime/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the preset the intervals came from, or "custom".
    #[serde(default = "default_work_method")]
    pub work_method: String,
    #[serde(default = "default_small_break_interval")]
    pub small_break_interval_min: u32,
    #[serde(default = "default_small_break_duration")]
    pub small_break_duration_sec: u32,
    #[serde(default = "default_big_break_interval")]
    pub big_break_interval_min: u32,
    #[serde(default = "default_big_break_duration")]
    pub big_break_duration_min: u32,
    #[serde(default)]
    pub break_mode: BreakMode,
    #[serde(default = "default_water_interval")]
    pub water_interval_min: u32,
    #[serde(default = "default_eye_interval")]
    pub eye_exercise_interval_min: u32,
    #[serde(default)]
    pub work_hours_enabled: bool,
    /// `HH:MM`, inclusive.
    #[serde(default = "default_work_hours_start")]
    pub work_hours_start: String,
    /// `HH:MM`, exclusive.
    #[serde(default = "default_work_hours_end")]
    pub work_hours_end: String,
}

// Default functions
fn default_work_method() -> String {
    "20-20-20".into()
}
fn default_small_break_interval() -> u32 {
    20
}
fn default_small_break_duration() -> u32 {
    20
}
fn default_big_break_interval() -> u32 {
    60
}
fn default_big_break_duration() -> u32 {
    5
}
fn default_water_interval() -> u32 {
    30
}
fn default_eye_interval() -> u32 {
    30
}
fn default_work_hours_start() -> String {
    "08:00".into()
}
fn default_work_hours_end() -> String {
    "18:00".into()
}

/// Seconds a non-break popup stays up when the host has no better idea.
const DEFAULT_REMINDER_POPUP_SECS: u64 = 30;

impl Default for Config {
    fn default() -> Self {
        Self {
            work_method: default_work_method(),
            small_break_interval_min: default_small_break_interval(),
            small_break_duration_sec: default_small_break_duration(),
            big_break_interval_min: default_big_break_interval(),
            big_break_duration_min: default_big_break_duration(),
            break_mode: BreakMode::default(),
            water_interval_min: default_water_interval(),
            eye_exercise_interval_min: default_eye_interval(),
            work_hours_enabled: false,
            work_hours_start: default_work_hours_start(),
            work_hours_end: default_work_hours_end(),
        }
    }
}

/// A named bundle of break intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkMethodPreset {
    pub name: &'static str,
    pub small_break_interval_min: u32,
    pub small_break_duration_sec: u32,
    pub big_break_interval_min: u32,
    pub big_break_duration_min: u32,
    pub eye_exercise_interval_min: u32,
}

/// Keys owned by a work-method preset.
const PRESET_KEYS: [&str; 5] = [
    "small_break_interval_min",
    "small_break_duration_sec",
    "big_break_interval_min",
    "big_break_duration_min",
    "eye_exercise_interval_min",
];

const PRESETS: [WorkMethodPreset; 4] = [
    WorkMethodPreset {
        name: "pomodoro",
        small_break_interval_min: 25,
        small_break_duration_sec: 300,
        big_break_interval_min: 100,
        big_break_duration_min: 15,
        eye_exercise_interval_min: 25,
    },
    WorkMethodPreset {
        name: "20-20-20",
        small_break_interval_min: 20,
        small_break_duration_sec: 20,
        big_break_interval_min: 60,
        big_break_duration_min: 5,
        eye_exercise_interval_min: 30,
    },
    WorkMethodPreset {
        name: "52-17",
        small_break_interval_min: 52,
        small_break_duration_sec: 1020,
        big_break_interval_min: 52,
        big_break_duration_min: 17,
        eye_exercise_interval_min: 52,
    },
    WorkMethodPreset {
        name: "90-min",
        small_break_interval_min: 90,
        small_break_duration_sec: 300,
        big_break_interval_min: 270,
        big_break_duration_min: 20,
        eye_exercise_interval_min: 30,
    },
];

impl WorkMethodPreset {
    pub fn all() -> &'static [WorkMethodPreset] {
        &PRESETS
    }

    pub fn find(name: &str) -> Option<&'static WorkMethodPreset> {
        PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl Config {
    fn set_json_value(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let obj = root
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?
                    .into(),
            ),
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(key.to_string(), new_value);
        Ok(())
    }

    /// Location of the config file in the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from an explicit path. Missing keys fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Config = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, typed after the current value.
    ///
    /// Changing an interval marks the work method as "custom".
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value(&mut json, key, value)?;
        let mut updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        if PRESET_KEYS.contains(&key) {
            updated.work_method = "custom".into();
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Copy a preset's intervals into this config.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), ConfigError> {
        let preset =
            WorkMethodPreset::find(name).ok_or_else(|| ConfigError::UnknownPreset(name.into()))?;
        self.work_method = preset.name.to_string();
        self.small_break_interval_min = preset.small_break_interval_min;
        self.small_break_duration_sec = preset.small_break_duration_sec;
        self.big_break_interval_min = preset.big_break_interval_min;
        self.big_break_duration_min = preset.big_break_duration_min;
        self.eye_exercise_interval_min = preset.eye_exercise_interval_min;
        Ok(())
    }

    /// Check intervals are positive and working hours are `HH:MM`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("small_break_interval_min", self.small_break_interval_min),
            ("big_break_interval_min", self.big_break_interval_min),
            ("water_interval_min", self.water_interval_min),
            ("eye_exercise_interval_min", self.eye_exercise_interval_min),
        ];
        for (key, minutes) in intervals {
            if minutes == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "interval must be at least one minute".into(),
                });
            }
        }
        for (key, value) in [
            ("work_hours_start", &self.work_hours_start),
            ("work_hours_end", &self.work_hours_end),
        ] {
            parse_time_of_day(value).map_err(|e| ConfigError::InvalidValue {
                key: key.into(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Interval of a cadence in seconds.
    pub fn interval_secs(&self, kind: EventKind) -> f64 {
        let minutes = match kind {
            EventKind::BigBreak => self.big_break_interval_min,
            EventKind::SmallBreak => self.small_break_interval_min,
            EventKind::EyeExercise => self.eye_exercise_interval_min,
            EventKind::WaterReminder => self.water_interval_min,
        };
        f64::from(minutes) * 60.0
    }

    /// How long the popup for `kind` should stay on screen.
    pub fn popup_duration_secs(&self, kind: EventKind) -> u64 {
        match kind {
            EventKind::SmallBreak => u64::from(self.small_break_duration_sec),
            EventKind::BigBreak => u64::from(self.big_break_duration_min) * 60,
            EventKind::EyeExercise | EventKind::WaterReminder => DEFAULT_REMINDER_POPUP_SECS,
        }
    }
}

/// Parse a zero-padded `HH:MM` into (hour, minute).
///
/// Zero padding matters: working hours are compared as strings.
pub(crate) fn parse_time_of_day(value: &str) -> Result<(u32, u32), ValidationError> {
    let err = || ValidationError::InvalidTimeOfDay(value.to_string());
    let (h, m) = value.split_once(':').ok_or_else(err)?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(h) || !two_digits(m) {
        return Err(err());
    }
    let hour: u32 = h.parse().map_err(|_| err())?;
    let minute: u32 = m.parse().map_err(|_| err())?;
    if hour > 23 || minute > 59 {
        return Err(err());
    }
    Ok((hour, minute))
}
