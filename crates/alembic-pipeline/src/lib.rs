//! Job orchestration for Alembic.
//!
//! [`IngestPipeline`] runs one dropped file through lock, extract, analyze,
//! write and archive. [`IngestDispatcher`] feeds it from the watched ingest
//! directory, one concurrent task per file.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dispatcher;
mod pipeline;

pub use dispatcher::IngestDispatcher;
pub use pipeline::{IngestPipeline, JobOutcome};
