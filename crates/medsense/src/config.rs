//! Configuration management for medsense.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "medsense";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "medsense.db";

/// Default slot holding the medication list.
pub const DEFAULT_SLOT_KEY: &str = "medsense_meds";

/// Longest poll cadence that still observes every `HH:MM` minute.
pub const MAX_POLL_INTERVAL_SECS: u64 = 60;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MEDSENSE_`)
/// 2. TOML config file at `~/.config/medsense/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Reminder loop configuration.
    pub reminder: ReminderConfig,
    /// Alert delivery configuration.
    pub alerts: AlertConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/medsense/medsense.db`
    pub database_path: Option<PathBuf>,
    /// Name of the slot holding the medication list.
    pub slot_key: String,
}

/// Reminder loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Seconds between schedule checks. Must be 1 to 60.
    pub poll_interval_secs: u64,
    /// Drop repeated times within one medication when it is added.
    pub dedupe_times: bool,
}

/// Alert delivery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Use system notifications when permission is granted.
    pub notifications_enabled: bool,
    /// Icon name or path passed to the notification backend.
    pub notification_icon: Option<String>,
    /// Show the fallback reminder as a dialog. When off it goes to the
    /// terminal only.
    pub dialogs_enabled: bool,
    /// Play a tone with each reminder.
    pub tone_enabled: bool,
    /// Tone frequency in hertz.
    pub tone_frequency_hz: f32,
    /// Tone amplitude, 0 (exclusive) to 1.
    pub tone_amplitude: f32,
    /// Tone length in milliseconds.
    pub tone_duration_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            slot_key: DEFAULT_SLOT_KEY.to_string(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            dedupe_times: true,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            notification_icon: Some("appointment-soon".to_string()),
            dialogs_enabled: true,
            tone_enabled: true,
            tone_frequency_hz: 440.0,
            tone_amplitude: 0.1,
            tone_duration_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("MEDSENSE_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_POLL_INTERVAL_SECS).contains(&self.reminder.poll_interval_secs) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "poll_interval_secs must be between 1 and {MAX_POLL_INTERVAL_SECS}, got {}",
                    self.reminder.poll_interval_secs
                ),
            });
        }

        if self.storage.slot_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "slot_key must not be empty".to_string(),
            });
        }

        let amplitude = self.alerts.tone_amplitude;
        if !(amplitude > 0.0 && amplitude <= 1.0) {
            return Err(Error::ConfigValidation {
                message: format!("tone_amplitude must be in (0, 1], got {amplitude}"),
            });
        }

        if !(self.alerts.tone_frequency_hz.is_finite() && self.alerts.tone_frequency_hz > 0.0) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "tone_frequency_hz must be positive, got {}",
                    self.alerts.tone_frequency_hz
                ),
            });
        }

        if self.alerts.tone_duration_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "tone_duration_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.reminder.poll_interval_secs)
    }

    /// Get the tone length as a Duration.
    #[must_use]
    pub fn tone_duration(&self) -> Duration {
        Duration::from_millis(self.alerts.tone_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.reminder.poll_interval_secs, 30);
        assert!(config.reminder.dedupe_times);
        assert!(config.alerts.notifications_enabled);
        assert!(config.alerts.tone_enabled);
        assert!(config.alerts.dialogs_enabled);
        assert_eq!(config.storage.slot_key, "medsense_meds");
    }

    #[test]
    fn test_default_alert_config() {
        let alerts = AlertConfig::default();

        assert!((alerts.tone_frequency_hz - 440.0).abs() < f32::EPSILON);
        assert!((alerts.tone_amplitude - 0.1).abs() < f32::EPSILON);
        assert_eq!(alerts.tone_duration_ms, 500);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_poll_interval_bounds() {
        let mut config = Config::default();

        config.reminder.poll_interval_secs = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("poll_interval_secs"));

        config.reminder.poll_interval_secs = 61;
        assert!(config.validate().is_err());

        config.reminder.poll_interval_secs = 60;
        assert!(config.validate().is_ok());

        config.reminder.poll_interval_secs = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_tone_amplitude() {
        let mut config = Config::default();

        config.alerts.tone_amplitude = 0.0;
        assert!(config.validate().is_err());

        config.alerts.tone_amplitude = 1.5;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tone_amplitude"));

        config.alerts.tone_amplitude = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_tone_frequency_and_duration() {
        let mut config = Config::default();
        config.alerts.tone_frequency_hz = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.alerts.tone_duration_ms = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tone_duration_ms"));
    }

    #[test]
    fn test_validate_empty_slot_key() {
        let mut config = Config::default();
        config.storage.slot_key = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("medsense.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.tone_duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("medsense"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[reminder]\npoll_interval_secs = 15\n\n[alerts]\ntone_enabled = false\n",
            )?;

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.reminder.poll_interval_secs, 15);
            assert!(!config.alerts.tone_enabled);
            assert!(config.alerts.notifications_enabled);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_toml_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[reminder]\npoll_interval_secs = 120\n")?;

            let err = Config::load_from(Some(PathBuf::from("config.toml"))).unwrap_err();
            assert!(err.to_string().contains("poll_interval_secs"));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[reminder]\npoll_interval_secs = 15\n\n[storage]\nslot_key = \"meds\"\n",
            )?;
            jail.set_env("MEDSENSE_REMINDER__POLL_INTERVAL_SECS", "10");

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.reminder.poll_interval_secs, 10);
            assert_eq!(config.storage.slot_key, "meds");
            Ok(())
        });
    }

    #[test]
    fn test_env_value_is_validated() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MEDSENSE_REMINDER__POLL_INTERVAL_SECS", "0");

            let result = Config::load_from(Some(PathBuf::from("missing.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_reminder_config_deserialize_partial() {
        let json = r#"{"poll_interval_secs": 10}"#;
        let reminder: ReminderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(reminder.poll_interval_secs, 10);
        assert!(reminder.dedupe_times);
    }
}
