//! Ingestion jobs and their lifecycle
//!
//! A [`Job`] exists only after its source file has been claimed by renaming it
//! to the in-progress suffix. From there it moves forward through extraction,
//! analysis and writing until it is archived, discarded or quarantined.
//!
//! ```text
//! Unclaimed ──claim──▶ Locked ──▶ Extracted ──▶ Analyzed ──▶ Written ──▶ Archived
//!                        │            │            │            │
//!                        ├──▶ Discarded            │            │
//!                        └────────────┴────────────┴────────────┴──▶ Errored
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockState {
    /// File sits in the drop directory, nobody owns it
    Unclaimed,
    /// Renamed to the in-progress suffix by this job
    Locked,
    /// Normalized text obtained
    Extracted,
    /// Analyzer returned a record
    Analyzed,
    /// Note persisted
    Written,
    /// Source moved to the archive
    Archived,
    /// Source unlinked after a soft miss (duplicate URL or empty content)
    Discarded,
    /// Source renamed to the error suffix
    Errored,
}

impl LockState {
    /// Whether `self -> next` is a legal move
    pub fn can_transition_to(self, next: LockState) -> bool {
        use LockState::*;
        matches!(
            (self, next),
            (Unclaimed, Locked)
                | (Locked, Extracted | Discarded | Errored)
                | (Extracted, Analyzed | Errored)
                | (Analyzed, Written | Errored)
                | (Written, Archived | Errored)
        )
    }

    /// Lowercase label used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unclaimed => "unclaimed",
            Self::Locked => "locked",
            Self::Extracted => "extracted",
            Self::Analyzed => "analyzed",
            Self::Written => "written",
            Self::Archived => "archived",
            Self::Discarded => "discarded",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from job bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    /// Attempted an illegal lifecycle move
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition {
        /// State the job was in
        from: LockState,
        /// Requested state
        to: LockState,
    },
}

/// Scratch directory produced by a scrape: `page.txt` plus an `images/` folder.
///
/// The writer copies from here; nothing removes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingAssets {
    dir: PathBuf,
}

impl StagingAssets {
    /// Name of the staged page text file
    pub const PAGE_FILE: &'static str = "page.txt";
    /// Name of the image subdirectory
    pub const IMAGES_DIR: &'static str = "images";

    /// Wrap a per-fingerprint staging directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The per-fingerprint directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the staged page text
    pub fn page_path(&self) -> PathBuf {
        self.dir.join(Self::PAGE_FILE)
    }

    /// Directory holding captured images
    pub fn images_dir(&self) -> PathBuf {
        self.dir.join(Self::IMAGES_DIR)
    }
}

/// One ingestion attempt for one dropped file.
#[derive(Debug, Clone)]
pub struct Job {
    id: Uuid,
    source_path: PathBuf,
    locked_path: PathBuf,
    state: LockState,
    staging: Option<StagingAssets>,
    claimed_at: DateTime<Utc>,
}

impl Job {
    /// Record a successful claim.
    ///
    /// Only the lock manager should call this, right after the rename to
    /// `locked_path` succeeded.
    pub fn claimed(source_path: PathBuf, locked_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path,
            locked_path,
            state: LockState::Locked,
            staging: None,
            claimed_at: Utc::now(),
        }
    }

    /// Job identifier used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Where the file was dropped
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Where the file lives while the job owns it
    pub fn locked_path(&self) -> &Path {
        &self.locked_path
    }

    /// File name as dropped, used for archive and note source fields
    pub fn source_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lowercased extension of the dropped file
    pub fn source_extension(&self) -> Option<String> {
        self.source_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Current lifecycle state
    pub fn state(&self) -> LockState {
        self.state
    }

    /// When the claim happened
    pub fn claimed_at(&self) -> DateTime<Utc> {
        self.claimed_at
    }

    /// Staging directory attached by a scrape, if any
    pub fn staging(&self) -> Option<&StagingAssets> {
        self.staging.as_ref()
    }

    /// Attach the scrape's staging directory
    pub fn attach_staging(&mut self, staging: StagingAssets) {
        self.staging = Some(staging);
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn advance(&mut self, next: LockState) -> Result<(), JobError> {
        if !self.state.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::claimed(
            PathBuf::from("/in/chat.json"),
            PathBuf::from("/in/chat.json.processing"),
        )
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = job();
        assert_eq!(job.state(), LockState::Locked);

        for next in [
            LockState::Extracted,
            LockState::Analyzed,
            LockState::Written,
            LockState::Archived,
        ] {
            job.advance(next).unwrap();
        }

        assert_eq!(job.state(), LockState::Archived);
        assert!(!job.state().can_transition_to(LockState::Errored));
    }

    #[test]
    fn test_claim_time_is_recorded() {
        let before = Utc::now();
        let job = job();
        assert!(job.claimed_at() >= before && job.claimed_at() <= Utc::now());
    }

    #[test]
    fn test_any_in_flight_state_can_error() {
        for state in [
            LockState::Locked,
            LockState::Extracted,
            LockState::Analyzed,
            LockState::Written,
        ] {
            assert!(state.can_transition_to(LockState::Errored), "{state}");
        }
        assert!(!LockState::Archived.can_transition_to(LockState::Errored));
        assert!(!LockState::Unclaimed.can_transition_to(LockState::Errored));
    }

    #[test]
    fn test_skipping_phases_is_rejected() {
        let mut job = job();
        let err = job.advance(LockState::Written).unwrap_err();

        assert_eq!(
            err,
            JobError::InvalidTransition {
                from: LockState::Locked,
                to: LockState::Written
            }
        );
        assert_eq!(job.state(), LockState::Locked);
    }

    #[test]
    fn test_discard_only_from_locked() {
        assert!(LockState::Locked.can_transition_to(LockState::Discarded));
        assert!(!LockState::Extracted.can_transition_to(LockState::Discarded));
    }

    #[test]
    fn test_source_accessors() {
        let job = job();
        assert_eq!(job.source_name(), "chat.json");
        assert_eq!(job.source_extension().as_deref(), Some("json"));
    }

    #[test]
    fn test_staging_layout() {
        let staging = StagingAssets::new("/staging/abcd");
        assert_eq!(staging.page_path(), PathBuf::from("/staging/abcd/page.txt"));
        assert_eq!(staging.images_dir(), PathBuf::from("/staging/abcd/images"));
    }
}
