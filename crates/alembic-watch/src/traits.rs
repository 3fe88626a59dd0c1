//! Core traits for the file watching system.

use crate::{error::Result, events::FileEvent};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Core trait for file watching backends.
#[async_trait]
pub trait FileWatcher: Send + Sync {
    /// Get the backend type identifier.
    fn backend_type(&self) -> &'static str;

    /// Set the event sender for this watcher.
    /// This must be called before adding any watches.
    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<FileEvent>);

    /// Start watching the specified path with the given configuration.
    async fn watch(&mut self, path: PathBuf, config: WatchConfig) -> Result<WatchHandle>;

    /// Stop watching the specified path.
    async fn unwatch(&mut self, handle: WatchHandle) -> Result<()>;

    /// Get all active watches.
    fn active_watches(&self) -> Vec<WatchHandle>;

    /// Check if the backend is available on this platform.
    fn is_available(&self) -> bool;
}

/// Handle to an active watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchHandle {
    /// Unique identifier for this watch.
    pub id: String,

    /// Path being watched.
    pub path: PathBuf,
}

impl WatchHandle {
    /// Create a new watch handle.
    pub fn new(path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path,
        }
    }
}

/// Configuration for a file watch.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Identifier used in logs.
    pub id: String,

    /// Whether to watch recursively. The drop directory is watched flat.
    pub recursive: bool,

    /// Debouncing configuration.
    pub debounce: DebounceConfig,
}

impl WatchConfig {
    /// Create a new, non-recursive watch configuration.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            recursive: false,
            debounce: DebounceConfig::default(),
        }
    }

    /// Set recursive watching.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set debouncing configuration.
    pub fn with_debounce(mut self, debounce: DebounceConfig) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Debouncing configuration for file events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Debounce delay in milliseconds.
    pub delay_ms: u64,
}

impl DebounceConfig {
    /// Create a new debounce configuration.
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    /// Delay as a duration.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::new(100)
    }
}
