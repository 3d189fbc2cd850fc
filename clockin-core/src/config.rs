//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/clockin/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/clockin/` (~/.config/clockin/)
//! - Data: `$XDG_DATA_HOME/clockin/` (~/.local/share/clockin/)
//! - State/Logs: `$XDG_STATE_HOME/clockin/` (~/.local/state/clockin/)
//!
//! A few settings can also be overridden per invocation through environment
//! variables: `CLOCKIN_DB` for the database path, `CLOCKIN_DAY_START` and
//! `CLOCKIN_DAY_END` for the working-day window of the distribution report.

use crate::error::{Error, Result};
use crate::view::DayWindow;
use chrono::NaiveTime;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable overriding the database path
pub const DB_ENV: &str = "CLOCKIN_DB";
/// Environment variable overriding the working-day start (`HH:MM`)
pub const DAY_START_ENV: &str = "CLOCKIN_DAY_START";
/// Environment variable overriding the working-day end (`HH:MM`)
pub const DAY_END_ENV: &str = "CLOCKIN_DAY_END";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Database file path override (optional)
    pub database: Option<PathBuf>,

    /// Working-day window configuration
    #[serde(default)]
    pub day: DayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Working-day window used by the distribution report
#[derive(Debug, Deserialize)]
pub struct DayConfig {
    /// Start of the working day, `HH:MM`
    #[serde(default = "default_day_start")]
    pub start: String,

    /// End of the working day, `HH:MM`
    #[serde(default = "default_day_end")]
    pub end: String,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            start: default_day_start(),
            end: default_day_end(),
        }
    }
}

fn default_day_start() -> String {
    "08:30".to_string()
}

fn default_day_end() -> String {
    "21:00".to_string()
}

impl DayConfig {
    /// Resolve the working-day window, letting `CLOCKIN_DAY_START` /
    /// `CLOCKIN_DAY_END` take precedence over the config file.
    ///
    /// Values that do not parse as `HH:MM` fall back to the defaults.
    pub fn window(&self) -> DayWindow {
        let start = std::env::var(DAY_START_ENV).unwrap_or_else(|_| self.start.clone());
        let end = std::env::var(DAY_END_ENV).unwrap_or_else(|_| self.end.clone());

        DayWindow::new(
            parse_time_of_day(&start, DayWindow::DEFAULT_START),
            parse_time_of_day(&end, DayWindow::DEFAULT_END),
        )
    }
}

fn parse_time_of_day(value: &str, fallback: NaiveTime) -> NaiveTime {
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(value, error = %e, "invalid HH:MM time of day, using default");
            fallback
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Resolve the database path.
    ///
    /// Precedence: explicit override (CLI flag) > `CLOCKIN_DB` > config file >
    /// `$XDG_DATA_HOME/clockin/db`.
    pub fn resolve_database(&self, override_path: Option<PathBuf>) -> PathBuf {
        if let Some(path) = override_path {
            return path;
        }
        if let Some(path) = std::env::var_os(DB_ENV) {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.database {
            return path.clone();
        }
        Self::database_path()
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/clockin/config.toml` (~/.config/clockin/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("clockin").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite database)
    ///
    /// `$XDG_DATA_HOME/clockin/` (~/.local/share/clockin/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("clockin")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/clockin/` (~/.local/state/clockin/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("clockin")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/clockin/db` (~/.local/share/clockin/db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/clockin/clockin.log` (~/.local/state/clockin/clockin.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("clockin.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.is_none());
        assert_eq!(config.day.start, "08:30");
        assert_eq!(config.day.end, "21:00");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
database = "/tmp/clockin-test/db"

[day]
start = "09:00"
end = "18:30"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.database.as_deref(), Some("/tmp/clockin-test/db".as_ref()));
        assert_eq!(config.day.start, "09:00");
        assert_eq!(config.day.end, "18:30");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_day_time_falls_back_to_default() {
        let day = DayConfig {
            start: "not a time".to_string(),
            end: "25:99".to_string(),
        };
        let window = day.window();
        assert_eq!(window.start, DayWindow::DEFAULT_START);
        assert_eq!(window.end, DayWindow::DEFAULT_END);
    }

    #[test]
    fn test_window_parses_configured_times() {
        let day = DayConfig {
            start: "07:15".to_string(),
            end: "19:45".to_string(),
        };
        let window = day.window();
        assert_eq!(window.start, NaiveTime::from_hms_opt(7, 15, 0).unwrap());
        assert_eq!(window.end, NaiveTime::from_hms_opt(19, 45, 0).unwrap());
    }
}
