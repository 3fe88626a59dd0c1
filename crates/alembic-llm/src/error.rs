//! Analyzer errors
//!
//! These never escape [`crate::ChatInsightAnalyzer::analyze`]; they are
//! folded into the processing-error record. [`crate::ChatInsightAnalyzer::try_analyze`]
//! exposes them for callers that want the cause.

use thiserror::Error;

/// Why an analysis attempt failed.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The API key environment variable is unset or empty
    #[error("API key not set: export {env_var}")]
    MissingApiKey {
        /// Name of the variable that was read
        env_var: String,
    },

    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error ({status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// The response had no choices or empty content
    #[error("Empty response from model")]
    EmptyResponse,

    /// The content was not an insight record
    #[error("Response does not match the insight schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Result type for analyzer internals
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
