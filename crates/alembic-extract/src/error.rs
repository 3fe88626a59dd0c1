//! Extraction errors

use alembic_core::DedupError;
use thiserror::Error;

/// Hard extraction failures. Soft misses are `Ok(None)`, not errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Reading the source or writing staging files failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A `.json` source is not valid JSON
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A text source is not valid UTF-8
    #[error("Source is not valid UTF-8 text")]
    NotUtf8,

    /// The browser could not be launched or a page could not be opened
    #[error("Browser error: {0}")]
    Browser(String),

    /// The page opened but harvesting its content failed
    #[error("Scrape failed for {url}: {reason}")]
    Scrape {
        /// Page being scraped
        url: String,
        /// What went wrong
        reason: String,
    },

    /// Recording the URL as processed failed
    #[error("Dedup store error: {0}")]
    Dedup(#[from] DedupError),
}

impl From<chromiumoxide::error::CdpError> for ExtractError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ExtractError::Browser(err.to_string())
    }
}

/// Result type for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;
