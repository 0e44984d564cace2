//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the logging runtime.
//!
//! Config is used in two ways:
//! 1. **Runtime creation**: `Logging::builder(config)`
//! 2. **Settings seed**: the `settings` map pre-fills the [`Settings`](crate::Settings) store
//!
//! ## Sentinel values
//! - `interval_ms = 0` → no sleep between cycles (the loop only yields)
//! - `fault_capacity = 0` → clamped to 1
//!
//! ## File format
//! ```yaml
//! runspace-name: logging
//! interval-ms: 100
//! fault-capacity: 128
//! settings:
//!   logging.disable_flush_on_exit: false
//!   logging.provider.logfile.path: /var/log/dba/agent.log
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::SettingValue;

/// Global configuration for the logging runtime.
///
/// ## Field semantics
/// - `runspace_name`: name the dispatch loop is registered under in the runspace host
/// - `interval_ms`: pause between dispatch cycles (`0` = no pause)
/// - `fault_capacity`: how many recent faults each provider keeps (min 1)
/// - `settings`: initial values for the settings store
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the runspace hosting the dispatch loop.
    #[serde(rename = "runspace-name")]
    pub runspace_name: String,

    /// Pause between dispatch cycles in milliseconds.
    ///
    /// Trades dispatch latency against busy-spinning; not correctness-critical.
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,

    /// Number of recent faults retained per provider.
    ///
    /// Older faults are evicted first; the total count keeps growing.
    #[serde(rename = "fault-capacity")]
    pub fault_capacity: usize,

    /// Initial settings store contents.
    pub settings: HashMap<String, SettingValue>,
}

impl Config {
    /// Returns the pause between cycles as an `Option`.
    ///
    /// - `None` → no pause
    /// - `Some(d)` → sleep `d` after each cycle
    #[inline]
    pub fn interval(&self) -> Option<Duration> {
        if self.interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.interval_ms))
        }
    }

    /// Returns the per-provider fault capacity clamped to a minimum of 1.
    #[inline]
    pub fn fault_capacity_clamped(&self) -> usize {
        self.fault_capacity.max(1)
    }

    /// Loads configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "loaded logging config");
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `runspace_name = "logging"`
    /// - `interval_ms = 100`
    /// - `fault_capacity = 128`
    /// - `settings = {}`
    fn default() -> Self {
        Self {
            runspace_name: "logging".to_string(),
            interval_ms: 100,
            fault_capacity: 128,
            settings: HashMap::new(),
        }
    }
}
