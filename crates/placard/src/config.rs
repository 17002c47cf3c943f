//! Configuration management for placard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "placard";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "placard.db";

/// Storage key the history collection lives under.
pub const DEFAULT_HISTORY_KEY: &str = "announcementHistory";

/// Public time endpoint queried when the clock is shown.
pub const DEFAULT_TIME_ENDPOINT: &str = "https://worldtimeapi.org/api/ip";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PLACARD_`, sections split on `__`)
/// 2. TOML config file at `~/.config/placard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Clock and time source configuration.
    pub clock: ClockConfig,
    /// Display configuration.
    pub display: DisplayConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/placard/placard.db`
    pub database_path: Option<PathBuf>,
    /// Key under which the whole history collection is stored.
    pub history_key: String,
}

/// Clock-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Public time endpoint returning JSON with `datetime` or `unixtime`.
    pub endpoint: String,
    /// Interval between clock renders in milliseconds.
    pub tick_interval_ms: u64,
    /// `strftime` format for the rendered clock.
    pub time_format: String,
    /// Request timeout in seconds. Unset leaves the HTTP client default.
    pub request_timeout_secs: Option<u64>,
}

/// Display-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// `strftime` format for the timestamp stored with each record.
    pub timestamp_format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            history_key: DEFAULT_HISTORY_KEY.to_string(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TIME_ENDPOINT.to_string(),
            tick_interval_ms: 1000,
            time_format: "%H:%M:%S".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamp_format: "%d/%m/%Y, %H:%M:%S".to_string(),
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
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("PLACARD_").split("__"));

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
        if self.storage.history_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "history_key must not be empty".to_string(),
            });
        }

        match reqwest::Url::parse(&self.clock.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(Error::ConfigValidation {
                    message: format!("endpoint scheme must be http or https, got {}", url.scheme()),
                });
            }
            Err(e) => {
                return Err(Error::ConfigValidation {
                    message: format!("invalid endpoint {}: {e}", self.clock.endpoint),
                });
            }
        }

        if self.clock.tick_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "tick_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.clock.request_timeout_secs == Some(0) {
            return Err(Error::ConfigValidation {
                message: "request_timeout_secs must be greater than 0 when set".to_string(),
            });
        }

        validate_format("time_format", &self.clock.time_format)?;
        validate_format("timestamp_format", &self.display.timestamp_format)?;

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

    /// Get the tick interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.clock.tick_interval_ms)
    }

    /// Get the request timeout as a Duration, if configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.clock.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Reject empty or unparseable `strftime` patterns.
fn validate_format(name: &str, pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: format!("{name} must not be empty"),
        });
    }

    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(Error::ConfigValidation {
            message: format!("{name} is not a valid strftime pattern: {pattern:?}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.storage.history_key, "announcementHistory");
        assert_eq!(config.clock.endpoint, DEFAULT_TIME_ENDPOINT);
        assert_eq!(config.clock.tick_interval_ms, 1000);
        assert!(config.clock.request_timeout_secs.is_none());
    }

    #[test]
    fn test_default_display_config() {
        let display = DisplayConfig::default();
        assert_eq!(display.timestamp_format, "%d/%m/%Y, %H:%M:%S");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_history_key() {
        let mut config = Config::default();
        config.storage.history_key = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("history_key"));
    }

    #[test]
    fn test_validate_zero_tick_interval() {
        let mut config = Config::default();
        config.clock.tick_interval_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tick_interval_ms"));
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = Config::default();
        config.clock.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        config.clock.endpoint = "ftp://time.example/now".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("http or https"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.clock.request_timeout_secs = Some(0);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("request_timeout_secs"));
    }

    #[test]
    fn test_validate_empty_formats() {
        let mut config = Config::default();
        config.clock.time_format = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.timestamp_format = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_strftime() {
        let mut config = Config::default();
        config.clock.time_format = "%H:%Q".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("time_format"));
        assert!(err.contains("strftime"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("placard.db"));
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
    fn test_tick_interval() {
        let config = Config::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_request_timeout() {
        let mut config = Config::default();
        assert!(config.request_timeout().is_none());

        config.clock.request_timeout_secs = Some(5);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("placard"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_clock_config_deserialize() {
        let json = r#"{"endpoint": "http://localhost:8080/now", "tick_interval_ms": 250}"#;
        let clock: ClockConfig = serde_json::from_str(json).unwrap();
        assert_eq!(clock.endpoint, "http://localhost:8080/now");
        assert_eq!(clock.tick_interval_ms, 250);
        assert_eq!(clock.time_format, "%H:%M:%S");
    }

    #[test]
    fn test_storage_config_serialize() {
        let storage = StorageConfig::default();
        let json = serde_json::to_string(&storage).unwrap();
        assert!(json.contains("history_key"));
    }
}
