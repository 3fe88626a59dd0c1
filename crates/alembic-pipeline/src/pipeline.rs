//! Per-file ingestion pipeline
//!
//! ## Pipeline Architecture
//!
//! 1. **Lock**: rename the dropped file to the in-progress suffix
//! 2. **Extract**: classify and normalize its content (may scrape a URL)
//! 3. **Analyze**: turn the text into an insight record
//! 4. **Write**: persist the record as a note
//! 5. **Archive**: move the source into the archive directory
//!
//! Any error after the lock quarantines the file. A soft miss during
//! extraction discards it.
//!
//! ```text
//! IngestPipeline (orchestration)
//!   ├─> JobLockManager   (lock, settle, archive, discard, quarantine)
//!   ├─> ContentExtractor (phase 2)
//!   ├─> InsightAnalyzer  (phase 3)
//!   └─> NoteWriter       (phase 4)
//! ```

use alembic_core::{InsightAnalyzer, Job, LockState, NoteWriter};
use alembic_extract::ContentExtractor;
use alembic_watch::JobLockManager;
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// How one job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Not a candidate (hidden, suffixed or a directory)
    Skipped,
    /// Another task claimed the file first, or it vanished
    ClaimLost,
    /// Duplicate URL or empty content; the source was deleted
    Discarded,
    /// Note written and source archived
    Archived {
        /// Written note
        note: PathBuf,
        /// Archived source
        archived: PathBuf,
    },
    /// A phase failed; the source carries the error suffix
    Quarantined {
        /// Failure chain, outermost context first
        error: String,
    },
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Skipped => f.write_str("skipped"),
            JobOutcome::ClaimLost => f.write_str("claim lost"),
            JobOutcome::Discarded => f.write_str("discarded"),
            JobOutcome::Archived { note, .. } => write!(f, "archived, note {}", note.display()),
            JobOutcome::Quarantined { error } => write!(f, "quarantined: {error}"),
        }
    }
}

/// The orchestrator for a single dropped file.
///
/// All collaborators are injected; the pipeline itself holds no state between
/// jobs and is shared across tasks behind an `Arc`.
pub struct IngestPipeline {
    locks: JobLockManager,
    extractor: ContentExtractor,
    analyzer: Arc<dyn InsightAnalyzer>,
    writer: Arc<dyn NoteWriter>,
}

impl IngestPipeline {
    /// Create a pipeline from its collaborators.
    pub fn new(
        locks: JobLockManager,
        extractor: ContentExtractor,
        analyzer: Arc<dyn InsightAnalyzer>,
        writer: Arc<dyn NoteWriter>,
    ) -> Self {
        Self {
            locks,
            extractor,
            analyzer,
            writer,
        }
    }

    /// Lock manager, for startup checks and status reporting
    pub fn locks(&self) -> &JobLockManager {
        &self.locks
    }

    /// Run one file through every phase.
    ///
    /// Never returns an error: failures after the lock are turned into a
    /// quarantine and reported as [`JobOutcome::Quarantined`].
    pub async fn run_job(&self, path: &Path) -> JobOutcome {
        if !self.locks.filter().is_candidate(path) {
            debug!(path = %path.display(), "Not a candidate");
            return JobOutcome::Skipped;
        }
        if tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
            return JobOutcome::Skipped;
        }

        let Some(mut job) = self.locks.claim(path).await else {
            return JobOutcome::ClaimLost;
        };
        let start = Instant::now();
        self.locks.settle().await;

        let outcome = match self.process(&mut job).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail(&mut job, e).await,
        };

        info!(
            job_id = %job.id(),
            state = %job.state(),
            claimed_at = %job.claimed_at().to_rfc3339(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Finished {}: {}",
            job.source_name(),
            outcome
        );
        outcome
    }

    async fn process(&self, job: &mut Job) -> Result<JobOutcome> {
        let name = job.source_name();

        // Phase 2: Extract
        info!(job_id = %job.id(), "Extracting {}", name);
        let extraction = self
            .extractor
            .extract(job)
            .await
            .with_context(|| format!("Extraction failed for '{name}'"))?;

        let Some(extraction) = extraction else {
            self.locks
                .discard(job)
                .await
                .with_context(|| format!("Failed to discard '{name}'"))?;
            return Ok(JobOutcome::Discarded);
        };
        job.advance(LockState::Extracted)?;
        debug!(job_id = %job.id(), kind = extraction.kind, chars = extraction.text.len(), "Extracted");

        // Phase 3: Analyze (infallible, failures come back as the sentinel)
        info!(job_id = %job.id(), "Analyzing {}", name);
        let record = self.analyzer.analyze(&extraction.text).await;
        if record.is_processing_error() {
            warn!(job_id = %job.id(), reason = %record.solution_insight, "Analyzer returned processing-error record");
        }
        job.advance(LockState::Analyzed)?;

        // Phase 4: Write
        let note = self
            .writer
            .write_note(&record, &name, extraction.staging.as_ref())
            .await
            .with_context(|| format!("Failed to write note for '{name}'"))?;
        job.advance(LockState::Written)?;
        info!(job_id = %job.id(), note = %note.display(), "Note created");

        // Phase 5: Archive
        let archived = self
            .locks
            .archive(job)
            .await
            .with_context(|| format!("Failed to archive '{name}'"))?;

        Ok(JobOutcome::Archived { note, archived })
    }

    async fn fail(&self, job: &mut Job, err: anyhow::Error) -> JobOutcome {
        let error = format!("{err:#}");
        error!(job_id = %job.id(), error = %error, "Failed to process {}", job.source_name());

        if let Err(quarantine_err) = self.locks.quarantine(job).await {
            error!(
                job_id = %job.id(),
                path = %job.locked_path().display(),
                error = %quarantine_err,
                "Failed to quarantine, file left in progress"
            );
        }
        JobOutcome::Quarantined { error }
    }
}
