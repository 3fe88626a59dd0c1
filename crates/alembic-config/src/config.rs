//! Top-level configuration and loading

use crate::components::{LlmConfig, LoggingConfig, PathsConfig, ScrapeConfig, WatchConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Complete configuration, one field per TOML section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlembicConfig {
    /// `[paths]`
    #[serde(default)]
    pub paths: PathsConfig,
    /// `[watch]`
    #[serde(default)]
    pub watch: WatchConfig,
    /// `[scrape]`
    #[serde(default)]
    pub scrape: ScrapeConfig,
    /// `[llm]`
    #[serde(default)]
    pub llm: LlmConfig,
    /// `[logging]`
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AlembicConfig {
    /// Default config file location (`~/.config/alembic/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("alembic").join("config.toml"))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one the default location is used
    /// when present, otherwise built-in defaults apply. The result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text without validating it
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let watch = &self.watch;
        if watch.in_progress_suffix.is_empty() {
            return Err(invalid("watch.in_progress_suffix", "must not be empty"));
        }
        if watch.error_suffix.is_empty() {
            return Err(invalid("watch.error_suffix", "must not be empty"));
        }
        if watch.in_progress_suffix == watch.error_suffix {
            return Err(invalid(
                "watch.error_suffix",
                "must differ from watch.in_progress_suffix",
            ));
        }

        if self.scrape.stability_threshold == 0 {
            return Err(invalid("scrape.stability_threshold", "must be at least 1"));
        }
        if self.scrape.max_scroll_steps == 0 {
            return Err(invalid("scrape.max_scroll_steps", "must be at least 1"));
        }
        if self.llm.max_input_chars == 0 {
            return Err(invalid("llm.max_input_chars", "must be at least 1"));
        }

        if self.paths.archive_dir() == self.paths.ingest_dir() {
            return Err(invalid(
                "paths.archive_dir",
                "must differ from paths.ingest_dir",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
