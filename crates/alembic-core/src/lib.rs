//! Core domain types for the Alembic ingestion pipeline.
//!
//! This crate holds what every other crate agrees on: the [`Job`] lifecycle,
//! [`Fingerprint`]s, the [`InsightRecord`] exchanged between analyzer and
//! writer, and the traits those collaborators implement. It performs no IO of
//! its own beyond the in-memory dedup store used in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fingerprint;
pub mod insight;
pub mod job;
pub mod processing;
pub mod traits;

pub use fingerprint::Fingerprint;
pub use insight::{InsightRecord, PROCESSING_ERROR_TOPIC};
pub use job::{Job, JobError, LockState, StagingAssets};
pub use processing::{DedupError, DedupResult, DedupStore, InMemoryDedupStore};
pub use traits::{InsightAnalyzer, NoteWriter};
