//! Collaborator traits
//!
//! The pipeline depends on these abstractions; concrete implementations live in
//! `alembic-llm` and `alembic-notes`, and tests substitute in-memory fakes.

use crate::insight::InsightRecord;
use crate::job::StagingAssets;
use async_trait::async_trait;
use std::path::PathBuf;

/// Turns normalized conversation text into an [`InsightRecord`].
#[async_trait]
pub trait InsightAnalyzer: Send + Sync {
    /// Analyze `text`.
    ///
    /// Infallible by contract: on any failure implementations return
    /// [`InsightRecord::processing_error`].
    async fn analyze(&self, text: &str) -> InsightRecord;
}

/// Persists an [`InsightRecord`] as a note.
#[async_trait]
pub trait NoteWriter: Send + Sync {
    /// Write the note and return its path.
    ///
    /// `source_name` is the original dropped file name. Staged images, when
    /// present, are copied next to the note, never moved.
    async fn write_note(
        &self,
        record: &InsightRecord,
        source_name: &str,
        staging: Option<&StagingAssets>,
    ) -> anyhow::Result<PathBuf>;
}
