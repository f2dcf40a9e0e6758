//! Session settings
//!
//! Loaded from an optional JSON file; anything missing keeps its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::advisor::AdvisorSettings;
use crate::consts::TICK_RATE_HZ;
use crate::sim::{Rules, SetupError, Table};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] SetupError),
    #[error("tick rate must be positive")]
    TickRate,
}

/// Everything configurable about a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub table: Table,
    pub rules: Rules,
    pub advisor: AdvisorSettings,
    /// Ticks per second when pacing in real time
    pub tick_rate_hz: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            table: Table::default(),
            rules: Rules::default(),
            advisor: AdvisorSettings::default(),
            tick_rate_hz: TICK_RATE_HZ,
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.table.validate()?;
        self.rules.validate()?;
        if self.tick_rate_hz == 0 {
            return Err(SettingsError::TickRate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_table() {
        let settings = Settings::default();
        assert_eq!(settings.table.width, 800.0);
        assert_eq!(settings.table.height, 400.0);
        assert_eq!(settings.table.friction, 0.98);
        assert_eq!(settings.rules.max_shots, 10);
        assert_eq!(settings.rules.fallback_power, 8.0);
        assert_eq!(settings.advisor.port, 1234);
        assert_eq!(settings.tick_rate_hz, 60);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            Settings::from_json(r#"{"rules": {"max_shots": 3}, "advisor": {"port": 8080}}"#)
                .unwrap();
        assert_eq!(settings.rules.max_shots, 3);
        assert_eq!(settings.rules.fallback_power, 8.0);
        assert_eq!(settings.advisor.port, 8080);
        assert_eq!(settings.advisor.path, "/v1/chat/completions");
        assert_eq!(settings.table, Table::default());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            Settings::from_json(r#"{"table": {"friction": 1.5}}"#),
            Err(SettingsError::Invalid(SetupError::InvalidTable(_)))
        ));
        assert!(matches!(
            Settings::from_json(r#"{"tick_rate_hz": 0}"#),
            Err(SettingsError::TickRate)
        ));
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/billiards.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
