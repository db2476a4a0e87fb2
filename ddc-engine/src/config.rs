//! Configuration for the transaction engine.
//!
//! DDC/CI recommends but does not fix its timing values, so they live in
//! configuration with documented defaults rather than constants. Tests
//! shrink the delays to keep the suite fast.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Tunable protocol timings and the retry bound.
///
/// # Examples
///
/// ```
/// use ddc_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.max_retries, 2);
///
/// // TOML fields are individually optional
/// let config: EngineConfig = toml::from_str("max_retries = 5").unwrap();
/// assert_eq!(config.max_retries, 5);
/// assert_eq!(config.settle_delay_ms, 40);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum wait between writing a request and reading its reply,
    /// required for the display to prepare a response.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Minimum wait after a set before the next command on the same
    /// display, and the base unit for retry backoff.
    #[serde(default = "default_inter_command_delay_ms")]
    pub inter_command_delay_ms: u64,

    /// Additional attempts after a retryable failure (0 = single try).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Upper bound on a single blocking transport write or read; a
    /// timed-out call surfaces as a retryable transport fault.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    40
}

fn default_inter_command_delay_ms() -> u64 {
    50
}

fn default_max_retries() -> u32 {
    2
}

fn default_io_timeout_ms() -> u64 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            inter_command_delay_ms: default_inter_command_delay_ms(),
            max_retries: default_max_retries(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn inter_command_delay(&self) -> Duration {
        Duration::from_millis(self.inter_command_delay_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Failure loading an [`EngineConfig`] from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
