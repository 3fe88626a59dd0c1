//! Error types for the drop-directory watcher and lock manager.

use alembic_core::JobError;
use thiserror::Error;

/// Errors that can occur while watching or moving job files.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system watching error.
    #[error("File watching error: {0}")]
    Watch(String),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A job was asked to make an illegal lifecycle move.
    #[error(transparent)]
    Job(#[from] JobError),

    /// Invalid path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Convert notify errors to our error type.
impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err.to_string())
    }
}
