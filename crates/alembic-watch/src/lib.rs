//! # Alembic Drop-Directory Watching
//!
//! Observes the ingest directory and owns every filesystem move a job makes:
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  NotifyWatcher  │───▶│ CandidateFilter  │───▶│ JobLockManager  │
//! │ (debounced OS   │    │ (hidden, claimed │    │ (claim, settle, │
//! │  notifications) │    │  and failed)     │    │  archive, ...)  │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! The watcher only announces files. Claiming happens in the task that will
//! process the file, so duplicate notifications resolve themselves through the
//! rename race in [`JobLockManager::claim`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
pub mod error;
mod events;
mod filter;
mod lock;
pub mod traits;

pub use backends::NotifyWatcher;
pub use error::{Error, Result};
pub use events::{FileEvent, FileEventKind};
pub use filter::CandidateFilter;
pub use lock::{JobLockManager, StaleFiles};
pub use traits::{DebounceConfig, FileWatcher, WatchConfig, WatchHandle};
