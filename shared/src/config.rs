use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::error::{AppError, ErrorKind};
use crate::model::SectionId;
use crate::{
    DEFAULT_AUTOREFRESH_INTERVAL_SECS, DEFAULT_SECTION_ORDER,
    DEFAULT_WEBCAM_REFRESH_INTERVAL_SECS, MAX_AUTOREFRESH_MINUTES, MIN_AUTOREFRESH_MINUTES,
    SECONDS_PER_MINUTE,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::InvalidConfig, e.to_string())
    }
}

/// Build-time configuration of the app, usually bundled as JSON next to the
/// catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Carousel order. Sections missing here follow in catalog order.
    pub section_order: Vec<SectionId>,
    /// Image cache expiry, also the staleness threshold for a screen.
    pub webcam_refresh_interval_secs: u64,
    pub default_autorefresh_interval_secs: u32,
    pub default_dark_theme: bool,
    pub default_autorefresh: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            section_order: DEFAULT_SECTION_ORDER.iter().map(|s| SectionId::new(*s)).collect(),
            webcam_refresh_interval_secs: DEFAULT_WEBCAM_REFRESH_INTERVAL_SECS,
            default_autorefresh_interval_secs: DEFAULT_AUTOREFRESH_INTERVAL_SECS,
            default_dark_theme: false,
            default_autorefresh: false,
        }
    }
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webcam_refresh_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "webcam_refresh_interval_secs must be > 0".into(),
            ));
        }
        let min = u32::try_from(MIN_AUTOREFRESH_MINUTES).unwrap_or(1) * SECONDS_PER_MINUTE;
        let max = u32::try_from(MAX_AUTOREFRESH_MINUTES).unwrap_or(120) * SECONDS_PER_MINUTE;
        if !(min..=max).contains(&self.default_autorefresh_interval_secs) {
            return Err(ConfigError::Validation(format!(
                "default_autorefresh_interval_secs must be within [{min}, {max}]"
            )));
        }
        for (i, id) in self.section_order.iter().enumerate() {
            if self.section_order[..i].contains(id) {
                return Err(ConfigError::Validation(format!(
                    "section {id} listed twice in section_order"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn webcam_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.webcam_refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.section_order,
            vec![SectionId::new("pdd"), SectionId::new("sancy"), SectionId::new("lioran")]
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = AppConfig::from_json_str(r#"{ "default_dark_theme": true }"#).unwrap();
        assert!(config.default_dark_theme);
        assert_eq!(config.webcam_refresh_interval_secs, DEFAULT_WEBCAM_REFRESH_INTERVAL_SECS);
    }

    #[test]
    fn rejects_out_of_range_default_interval() {
        let err = AppConfig::from_json_str(r#"{ "default_autorefresh_interval_secs": 30 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_duplicate_sections() {
        let err = AppConfig::from_json_str(r#"{ "section_order": ["pdd", "pdd"] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            AppConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
