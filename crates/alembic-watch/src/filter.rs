//! Candidate filtering for the drop directory.
//!
//! Decides which file names are new input. Hidden files, files this process
//! has already claimed and quarantined files are never picked up again.

use crate::events::FileEvent;
use alembic_config::WatchConfig as WatchSettings;
use std::path::{Path, PathBuf};

/// Name-based filter shared by the dispatcher and the lock manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilter {
    in_progress_suffix: String,
    error_suffix: String,
}

impl CandidateFilter {
    /// Build a filter from explicit suffixes.
    pub fn new(in_progress_suffix: impl Into<String>, error_suffix: impl Into<String>) -> Self {
        Self {
            in_progress_suffix: in_progress_suffix.into(),
            error_suffix: error_suffix.into(),
        }
    }

    /// Build a filter from the `[watch]` section.
    pub fn from_settings(settings: &WatchSettings) -> Self {
        Self::new(&settings.in_progress_suffix, &settings.error_suffix)
    }

    /// Suffix marking a claimed file.
    pub fn in_progress_suffix(&self) -> &str {
        &self.in_progress_suffix
    }

    /// Suffix marking a quarantined file.
    pub fn error_suffix(&self) -> &str {
        &self.error_suffix
    }

    /// Whether `path` names a file that should be ingested.
    ///
    /// Only the name is inspected; existence and file type are the caller's
    /// concern.
    pub fn is_candidate(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        !(name.is_empty()
            || name.starts_with('.')
            || self.is_in_progress_name(name)
            || self.is_error_name(name))
    }

    /// Candidate path carried by an event, if the event announces new input.
    pub fn candidate_from_event(&self, event: &FileEvent) -> Option<PathBuf> {
        event
            .arrival_path()
            .filter(|path| self.is_candidate(path))
            .map(Path::to_path_buf)
    }

    /// Whether a file name carries the in-progress suffix.
    pub fn is_in_progress_name(&self, name: &str) -> bool {
        name.ends_with(&self.in_progress_suffix)
    }

    /// Whether a file name carries the error suffix.
    pub fn is_error_name(&self, name: &str) -> bool {
        name.ends_with(&self.error_suffix)
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::from_settings(&WatchSettings::default())
    }
}
