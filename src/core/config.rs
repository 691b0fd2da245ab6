//! Configuration management for the probe.
//!
//! Settings that do not belong on a Nagios command line live in an optional
//! YAML file:
//! - connection tuning (timeouts, initial database, certificate trust)
//! - where rate-of-change samples are persisted
//! - log level and format
//!
//! CLI arguments and environment variables override the file.

use crate::core::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for the probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection configuration
    pub connection: ConnectionConfig,
    /// State store configuration
    pub state: StateConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Database selected at login; per-database counters are filtered by
    /// instance name, so this rarely needs changing
    pub initial_database: String,
    /// Budget for TCP connect plus login
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Accept the server certificate without validation
    pub trust_server_certificate: bool,
    /// Port used when neither a port nor an instance is given
    pub default_port: u16,
}

/// State store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding one file per rate-of-change identity
    pub dir: PathBuf,
    /// File name prefix for state records
    pub file_prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Include targets and line numbers
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Queries and computed values
    Debug,
    /// Check progress
    Info,
    /// Recoverable problems only
    Warn,
    /// Failures only
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            connection: ConnectionConfig::default(),
            state: StateConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            initial_database: "master".to_string(),
            connect_timeout: Duration::from_secs(30),
            trust_server_certificate: true,
            default_port: 1433,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig {
            dir: std::env::temp_dir(),
            file_prefix: "mssql-".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Warn,
            structured: false,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.connection.initial_database.trim().is_empty() {
            return Err(ProbeError::config("initial_database must not be empty"));
        }

        if self.connection.connect_timeout.is_zero() {
            return Err(ProbeError::config("connect_timeout must be greater than 0"));
        }

        if self.connection.default_port == 0 {
            return Err(ProbeError::config("default_port must be greater than 0"));
        }

        if self.state.dir.as_os_str().is_empty() {
            return Err(ProbeError::config("state dir must not be empty"));
        }

        if self
            .state
            .file_prefix
            .contains(|c: char| std::path::is_separator(c))
        {
            return Err(ProbeError::config(format!(
                "state file_prefix must not contain a path separator: '{}'",
                self.state.file_prefix
            )));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| ProbeError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the state directory
    pub fn state_dir(mut self, path: PathBuf) -> Self {
        self.config.state.dir = path;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection.connect_timeout = timeout;
        self
    }

    /// Set the log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
