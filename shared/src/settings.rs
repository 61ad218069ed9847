use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::config::AppConfig;
use crate::error::{AppError, ErrorKind};
use crate::{MAX_AUTOREFRESH_MINUTES, MIN_AUTOREFRESH_MINUTES, SECONDS_PER_MINUTE};

pub const KEY_DARK_THEME: &str = "is_dark_theme";
pub const KEY_AUTOREFRESH: &str = "should_autorefresh";
pub const KEY_AUTOREFRESH_INTERVAL: &str = "autorefresh_interval_secs";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("refresh delay must be between {min} and {max} minutes, got {minutes}")]
    IntervalOutOfRange { minutes: i64, min: i64, max: i64 },
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        let SettingsError::IntervalOutOfRange { minutes, .. } = &e;
        let minutes = minutes.to_string();
        AppError::new(ErrorKind::Validation, e.to_string()).with_context("minutes", minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Values as read back from storage; any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredSettings {
    pub is_dark_theme: Option<bool>,
    pub should_autorefresh: Option<bool>,
    pub autorefresh_interval_secs: Option<u32>,
}

/// User preferences. Persisted by the app on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    is_dark_theme: bool,
    should_autorefresh: bool,
    autorefresh_interval_secs: u32,
}

impl Settings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            is_dark_theme: config.default_dark_theme,
            should_autorefresh: config.default_autorefresh,
            autorefresh_interval_secs: config.default_autorefresh_interval_secs,
        }
    }

    /// Overlays persisted values on the configured defaults. An interval outside
    /// the accepted range is dropped in favour of the default.
    #[must_use]
    pub fn restore(stored: StoredSettings, config: &AppConfig) -> Self {
        let mut settings = Self::from_config(config);
        if let Some(dark) = stored.is_dark_theme {
            settings.is_dark_theme = dark;
        }
        if let Some(enabled) = stored.should_autorefresh {
            settings.should_autorefresh = enabled;
        }
        if let Some(secs) = stored.autorefresh_interval_secs {
            if interval_secs_in_range(secs) {
                settings.autorefresh_interval_secs = secs;
            } else {
                warn!(secs, "ignoring persisted autorefresh interval out of range");
            }
        }
        settings
    }

    #[must_use]
    pub fn is_dark_theme(&self) -> bool {
        self.is_dark_theme
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        if self.is_dark_theme {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    #[must_use]
    pub fn should_autorefresh(&self) -> bool {
        self.should_autorefresh
    }

    #[must_use]
    pub fn autorefresh_interval_secs(&self) -> u32 {
        self.autorefresh_interval_secs
    }

    #[must_use]
    pub fn autorefresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.autorefresh_interval_secs))
    }

    #[must_use]
    pub fn autorefresh_interval_minutes(&self) -> u32 {
        self.autorefresh_interval_secs / SECONDS_PER_MINUTE
    }

    /// Returns whether the value changed.
    pub fn set_dark_theme(&mut self, enabled: bool) -> bool {
        let changed = self.is_dark_theme != enabled;
        self.is_dark_theme = enabled;
        changed
    }

    /// Returns whether the value changed.
    pub fn set_autorefresh(&mut self, enabled: bool) -> bool {
        let changed = self.should_autorefresh != enabled;
        self.should_autorefresh = enabled;
        changed
    }

    /// Accepts `1..=120` minutes. On rejection the stored interval is left as is.
    pub fn set_autorefresh_interval_minutes(&mut self, minutes: i64) -> Result<u32, SettingsError> {
        if !(MIN_AUTOREFRESH_MINUTES..=MAX_AUTOREFRESH_MINUTES).contains(&minutes) {
            return Err(SettingsError::IntervalOutOfRange {
                minutes,
                min: MIN_AUTOREFRESH_MINUTES,
                max: MAX_AUTOREFRESH_MINUTES,
            });
        }
        // Range checked above, fits in u32.
        let secs = u32::try_from(minutes).unwrap_or(1) * SECONDS_PER_MINUTE;
        self.autorefresh_interval_secs = secs;
        Ok(secs)
    }

    #[must_use]
    pub fn stored(&self) -> StoredSettings {
        StoredSettings {
            is_dark_theme: Some(self.is_dark_theme),
            should_autorefresh: Some(self.should_autorefresh),
            autorefresh_interval_secs: Some(self.autorefresh_interval_secs),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

fn interval_secs_in_range(secs: u32) -> bool {
    let secs = i64::from(secs);
    let per_minute = i64::from(SECONDS_PER_MINUTE);
    (MIN_AUTOREFRESH_MINUTES * per_minute..=MAX_AUTOREFRESH_MINUTES * per_minute).contains(&secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_above_max() {
        let mut settings = Settings::default();
        let before = settings.autorefresh_interval_secs();

        assert!(matches!(
            settings.set_autorefresh_interval_minutes(0),
            Err(SettingsError::IntervalOutOfRange { minutes: 0, .. })
        ));
        assert!(matches!(
            settings.set_autorefresh_interval_minutes(121),
            Err(SettingsError::IntervalOutOfRange { minutes: 121, .. })
        ));
        assert!(settings.set_autorefresh_interval_minutes(-5).is_err());
        assert_eq!(settings.autorefresh_interval_secs(), before);
    }

    #[test]
    fn accepts_sixty_minutes() {
        let mut settings = Settings::default();
        assert_eq!(settings.set_autorefresh_interval_minutes(60), Ok(3600));
        assert_eq!(settings.autorefresh_interval_secs(), 3600);
        assert_eq!(settings.autorefresh_interval_minutes(), 60);
    }

    #[test]
    fn accepts_bounds() {
        let mut settings = Settings::default();
        assert_eq!(settings.set_autorefresh_interval_minutes(1), Ok(60));
        assert_eq!(settings.set_autorefresh_interval_minutes(120), Ok(7200));
    }

    #[test]
    fn setters_report_changes() {
        let mut settings = Settings::default();
        assert!(settings.set_dark_theme(true));
        assert!(!settings.set_dark_theme(true));
        assert_eq!(settings.theme(), Theme::Dark);
        assert!(settings.set_autorefresh(true));
        assert!(!settings.set_autorefresh(true));
    }

    #[test]
    fn restore_overlays_persisted_values() {
        let config = AppConfig::default();
        let restored = Settings::restore(
            StoredSettings {
                is_dark_theme: Some(true),
                should_autorefresh: None,
                autorefresh_interval_secs: Some(1800),
            },
            &config,
        );
        assert!(restored.is_dark_theme());
        assert_eq!(restored.should_autorefresh(), config.default_autorefresh);
        assert_eq!(restored.autorefresh_interval_secs(), 1800);
    }

    #[test]
    fn restore_drops_out_of_range_interval() {
        let config = AppConfig::default();
        let restored = Settings::restore(
            StoredSettings {
                autorefresh_interval_secs: Some(10),
                ..StoredSettings::default()
            },
            &config,
        );
        assert_eq!(
            restored.autorefresh_interval_secs(),
            config.default_autorefresh_interval_secs
        );
    }

    #[test]
    fn validation_error_maps_to_app_error() {
        let err: AppError = SettingsError::IntervalOutOfRange { minutes: 0, min: 1, max: 120 }.into();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.context.get("minutes").map(String::as_str), Some("0"));
    }
}
