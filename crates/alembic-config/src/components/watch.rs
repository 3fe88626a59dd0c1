//! Watcher and lock configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the drop-directory observer and the rename lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchConfig {
    /// Suffix appended to a claimed file
    #[serde(default = "default_in_progress_suffix")]
    pub in_progress_suffix: String,
    /// Suffix appended to a quarantined file
    #[serde(default = "default_error_suffix")]
    pub error_suffix: String,
    /// Delay between claiming a file and reading it, absorbs slow writers
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Debounce window of the notify backend
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_in_progress_suffix() -> String {
    ".processing".to_string()
}

fn default_error_suffix() -> String {
    ".error".to_string()
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            in_progress_suffix: default_in_progress_suffix(),
            error_suffix: default_error_suffix(),
            settle_delay_ms: default_settle_delay_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WatchConfig {
    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Debounce window as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
