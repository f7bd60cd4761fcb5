//! Configuration loading for the bridge.
//!
//! Configuration is loaded from a TOML file; every table and field is
//! optional and falls back to the defaults below.

use crate::sdk::ClientLibOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BridgeConfig {
    /// Waiting behaviour.
    #[serde(default)]
    pub bridge: WaitConfig,
    /// Options handed to the client library at init.
    #[serde(default)]
    pub client_lib: ClientLibConfig,
}

/// Waiting behaviour of bridged calls.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitConfig {
    /// Absolute per-call deadline in milliseconds (default: 5000).
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
}

/// Client library init options.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientLibConfig {
    /// Log sinks to enable (default: none).
    #[serde(default = "default_log_types")]
    pub log_types: Vec<LogType>,
    /// Folder for SDK log files.
    pub log_file_folder: Option<PathBuf>,
    /// Folder holding SDK resources (sound backends, ...).
    pub resources_folder: Option<PathBuf>,
}

/// One of the SDK's log sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    /// No logging.
    None,
    /// Log to file.
    File,
    /// Log to stdout.
    Console,
    /// Deliver log lines through the user logging callback.
    UserLogging,
    /// Do not send logs to the TeamSpeak network log.
    NoNetLogging,
    /// Log to the database.
    Database,
    /// Log to syslog.
    Syslog,
}

impl LogType {
    /// Bit in the SDK's log type mask.
    pub fn bits(self) -> u32 {
        match self {
            Self::None => 0x00,
            Self::File => 0x01,
            Self::Console => 0x02,
            Self::UserLogging => 0x04,
            Self::NoNetLogging => 0x08,
            Self::Database => 0x10,
            Self::Syslog => 0x20,
        }
    }

    /// Combine sinks into one mask.
    pub fn mask(types: &[LogType]) -> u32 {
        types.iter().fold(0, |acc, t| acc | t.bits())
    }
}

// Default value functions
fn default_wait_timeout_ms() -> u64 {
    5000
}

fn default_log_types() -> Vec<LogType> {
    vec![LogType::None]
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: default_wait_timeout_ms(),
        }
    }
}

impl Default for ClientLibConfig {
    fn default() -> Self {
        Self {
            log_types: default_log_types(),
            log_file_folder: None,
            resources_folder: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds
    /// invalid values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the bridge cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.wait_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "bridge.wait_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Per-call deadline.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge.wait_timeout_ms)
    }

    /// Options passed to `ClientLib::init`.
    pub fn client_lib_options(&self) -> ClientLibOptions {
        ClientLibOptions {
            log_types: LogType::mask(&self.client_lib.log_types),
            log_file_folder: self.client_lib.log_file_folder.clone(),
            resources_folder: self.client_lib.resources_folder.clone(),
        }
    }

    /// Same configuration with a different deadline.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_millis().max(1);
        self.bridge.wait_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Parsed but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}
