//! Tool configuration
//!
//! Settings for the logger, live plotter and replay, stored as JSON. Every
//! field has a default so a config file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::protocol::DEFAULT_BAUD_RATE;

/// Default log file name used by all three tools
pub const DEFAULT_LOG_FILE: &str = "sensor_log.csv";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial logger settings
    pub logger: LoggerConfig,

    /// Live plotter settings
    pub live: LiveConfig,

    /// Replay settings
    pub replay: ReplayConfig,
}

/// Serial logger settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Serial port name; the first detected port when unset
    pub port: Option<String>,

    /// Baud rate
    pub baud_rate: u32,

    /// Read timeout in milliseconds
    pub timeout_ms: u64,

    /// CSV file to append to
    pub output: PathBuf,

    /// Add a host capture time column to new log files
    pub pc_time: bool,

    /// Readout period to request from the device at start, in milliseconds
    pub readout_period_ms: Option<u32>,

    /// LED intensity to request from the device at start
    pub led_intensity: Option<f64>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 1000,
            output: PathBuf::from(DEFAULT_LOG_FILE),
            pc_time: false,
            readout_period_ms: None,
            led_intensity: None,
        }
    }
}

/// Live plotter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// CSV file to watch
    pub input: PathBuf,

    /// Number of recent samples to show
    pub max_points: usize,

    /// Refresh interval in milliseconds
    pub interval_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_LOG_FILE),
            max_points: 300,
            interval_ms: 1000,
        }
    }
}

/// Replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// CSV file to replay
    pub input: PathBuf,

    /// Playback speed, 1.0 = real time, 2.0 = twice as fast
    pub speed: f64,

    /// Number of recent samples kept in the window
    pub max_window_size: usize,

    /// Samples emitted without delay before timed playback starts
    pub preload_count: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_LOG_FILE),
            speed: 5.0,
            max_window_size: 300,
            preload_count: 300,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Default location: `<config dir>/aircube/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aircube").join("config.json"))
    }

    /// Load from `path`, or from the default location when it exists, or
    /// fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Check values that would make a tool misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.replay.validate()?;
        self.live.validate()
    }
}

impl ReplayConfig {
    /// Check the replay settings
    ///
    /// Only non-finite speeds are rejected; zero and negative speeds are
    /// clamped to the minimum at playback time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.speed.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "replay.speed",
                message: format!("expected a finite number, got {}", self.speed),
            });
        }
        if self.max_window_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "replay.max_window_size",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl LiveConfig {
    /// Check the live plotter settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_points == 0 {
            return Err(ConfigError::InvalidValue {
                field: "live.max_points",
                message: "must be at least 1".into(),
            });
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "live.interval_ms",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
