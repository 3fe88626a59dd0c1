//! Headless scraping configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Browser, scroll loop and asset capture settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeConfig {
    /// Upper bound on page navigation
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    /// Per-selector wait when probing for the conversation container
    #[serde(default = "default_selector_timeout_secs")]
    pub selector_timeout_secs: u64,
    /// Pixels scrolled per step
    #[serde(default = "default_scroll_delta_px")]
    pub scroll_delta_px: f64,
    /// Pause after each scroll step so lazy content can load
    #[serde(default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,
    /// Consecutive unchanged height measurements that end the loop
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
    /// Hard cap on scroll steps
    #[serde(default = "default_max_scroll_steps")]
    pub max_scroll_steps: u32,
    /// Images smaller than this are treated as decorative
    #[serde(default = "default_min_asset_bytes")]
    pub min_asset_bytes: usize,
    /// URL substrings that mark tracking pixels and icons
    #[serde(default = "default_noise_markers")]
    pub noise_markers: Vec<String>,
    /// Chrome/Chromium binary; autodetected when unset
    pub chrome_executable: Option<PathBuf>,
    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,
}

fn default_navigation_timeout_secs() -> u64 {
    45
}

fn default_selector_timeout_secs() -> u64 {
    5
}

fn default_scroll_delta_px() -> f64 {
    3000.0
}

fn default_scroll_pause_ms() -> u64 {
    1000
}

fn default_stability_threshold() -> u32 {
    3
}

fn default_max_scroll_steps() -> u32 {
    150
}

fn default_min_asset_bytes() -> usize {
    1000
}

fn default_noise_markers() -> Vec<String> {
    vec!["pixel".to_string(), "icon".to_string()]
}

fn default_headless() -> bool {
    true
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout_secs(),
            selector_timeout_secs: default_selector_timeout_secs(),
            scroll_delta_px: default_scroll_delta_px(),
            scroll_pause_ms: default_scroll_pause_ms(),
            stability_threshold: default_stability_threshold(),
            max_scroll_steps: default_max_scroll_steps(),
            min_asset_bytes: default_min_asset_bytes(),
            noise_markers: default_noise_markers(),
            chrome_executable: None,
            headless: default_headless(),
        }
    }
}

impl ScrapeConfig {
    /// Navigation timeout as a duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Selector probe timeout as a duration
    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }

    /// Scroll pause as a duration
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }
}
