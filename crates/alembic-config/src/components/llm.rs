//! Analyzer endpoint configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible chat endpoint used by the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Base URL; `/models` and `/chat/completions` are appended
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fixed model; skips discovery when set
    pub model: Option<String>,
    /// Discovery preference order
    #[serde(default = "default_preferred_models")]
    pub preferred_models: Vec<String>,
    /// Used when discovery fails outright
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Input is truncated to this many characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// API timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_preferred_models() -> Vec<String> {
    vec![
        "gemini-3-flash-preview".to_string(),
        "gemini-2.5-flash".to_string(),
        "gemini-2.0-flash-exp".to_string(),
    ]
}

fn default_fallback_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_max_input_chars() -> usize {
    700_000
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: None,
            preferred_models: default_preferred_models(),
            fallback_model: default_fallback_model(),
            api_key_env: default_api_key_env(),
            max_input_chars: default_max_input_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// API key read from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
