//! Rename-based job locking and terminal file moves.
//!
//! A dropped file is claimed by renaming it to `<name><in-progress suffix>` in
//! place. `rename(2)` is atomic within a directory, so of two tasks racing for
//! the same file exactly one sees success; the other finds the source gone and
//! walks away. The suffix doubles as an on-disk marker that survives crashes.

use crate::error::Result;
use crate::filter::CandidateFilter;
use alembic_config::AlembicConfig;
use alembic_core::{Job, LockState};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Files left behind by interrupted or failed jobs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StaleFiles {
    /// Still carrying the in-progress suffix
    pub in_progress: Vec<PathBuf>,
    /// Quarantined with the error suffix
    pub errored: Vec<PathBuf>,
}

impl StaleFiles {
    /// Nothing to reconcile
    pub fn is_empty(&self) -> bool {
        self.in_progress.is_empty() && self.errored.is_empty()
    }
}

/// Claims dropped files and moves them to their final location.
#[derive(Debug, Clone)]
pub struct JobLockManager {
    filter: CandidateFilter,
    archive_dir: PathBuf,
    settle_delay: Duration,
}

impl JobLockManager {
    /// Create a manager.
    pub fn new(filter: CandidateFilter, archive_dir: PathBuf, settle_delay: Duration) -> Self {
        Self {
            filter,
            archive_dir,
            settle_delay,
        }
    }

    /// Create a manager from the loaded configuration.
    pub fn from_config(config: &AlembicConfig) -> Self {
        Self::new(
            CandidateFilter::from_settings(&config.watch),
            config.paths.archive_dir(),
            config.watch.settle_delay(),
        )
    }

    /// The name filter applied to candidates.
    pub fn filter(&self) -> &CandidateFilter {
        &self.filter
    }

    /// Archive destination directory.
    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Claim `path` for exclusive processing.
    ///
    /// Returns `None` when the rename fails, which means another task claimed
    /// the file first or it vanished. That is the normal outcome of a race and
    /// is not an error.
    pub async fn claim(&self, path: &Path) -> Option<Job> {
        let locked = self.locked_path_for(path).await;

        match tokio::fs::rename(path, &locked).await {
            Ok(()) => {
                let job = Job::claimed(path.to_path_buf(), locked);
                info!(
                    job_id = %job.id(),
                    path = %path.display(),
                    "Locked {}",
                    job.source_name()
                );
                Some(job)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Claim lost");
                None
            }
        }
    }

    /// Wait for the writer of a freshly claimed file to finish.
    pub async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    /// Move a finished job's file into the archive under its original name.
    ///
    /// Existing archive entries are never overwritten, not even by a job of the
    /// same name archiving at the same moment; a timestamped name is chosen
    /// instead.
    pub async fn archive(&self, job: &mut Job) -> Result<PathBuf> {
        check(job, LockState::Archived)?;

        tokio::fs::create_dir_all(&self.archive_dir).await?;
        let name = job.source_name();
        let destination =
            move_to_free(job.locked_path(), archive_candidates(&self.archive_dir, &name)).await?;
        job.advance(LockState::Archived)?;

        info!(
            job_id = %job.id(),
            archive = %destination.display(),
            "Archived {}",
            name
        );
        Ok(destination)
    }

    /// Rename a failed job's file in place to the error suffix.
    ///
    /// An earlier quarantined file of the same name is left untouched.
    pub async fn quarantine(&self, job: &mut Job) -> Result<PathBuf> {
        check(job, LockState::Errored)?;

        let dir = job
            .locked_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = job.source_name();
        let candidates = suffixed_candidates(&dir, &name, self.filter.error_suffix());
        let destination = move_to_free(job.locked_path(), candidates).await?;
        job.advance(LockState::Errored)?;

        warn!(
            job_id = %job.id(),
            path = %destination.display(),
            "Quarantined {}",
            name
        );
        Ok(destination)
    }

    /// Delete a job's file after a soft miss.
    pub async fn discard(&self, job: &mut Job) -> Result<()> {
        check(job, LockState::Discarded)?;

        tokio::fs::remove_file(job.locked_path()).await?;
        job.advance(LockState::Discarded)?;

        info!(job_id = %job.id(), "Discarded {}", job.source_name());
        Ok(())
    }

    /// List in-progress and quarantined files in `dir`.
    ///
    /// In-progress files found while no job is running belong to an interrupted
    /// run. They are reported, never resumed.
    pub async fn stale_files(&self, dir: &Path) -> Result<StaleFiles> {
        let mut stale = StaleFiles::default();
        let mut entries = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if self.filter.is_in_progress_name(name) {
                stale.in_progress.push(path);
            } else if self.filter.is_error_name(name) {
                stale.errored.push(path);
            }
        }

        stale.in_progress.sort();
        stale.errored.sort();
        Ok(stale)
    }

    /// `name<suffix>` unless a stale lock of that name is still on disk.
    async fn locked_path_for(&self, path: &Path) -> PathBuf {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        first_free(suffixed_candidates(&dir, &name, self.filter.in_progress_suffix())).await
    }
}

fn check(job: &Job, next: LockState) -> Result<()> {
    if job.state().can_transition_to(next) {
        Ok(())
    } else {
        Err(alembic_core::JobError::InvalidTransition {
            from: job.state(),
            to: next,
        }
        .into())
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// `name`, then `stem_<secs>.ext`, then `stem_<secs>_<n>.ext`.
fn archive_candidates(dir: &Path, name: &str) -> impl Iterator<Item = PathBuf> {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let secs = unix_seconds();
    let dir = dir.to_path_buf();
    let first = dir.join(name);

    std::iter::once(first)
        .chain(std::iter::once(dir.join(format!("{stem}_{secs}{ext}"))))
        .chain((1u32..).map(move |n| dir.join(format!("{stem}_{secs}_{n}{ext}"))))
}

/// `name<suffix>`, then `name_<secs><suffix>`, then `name_<secs>_<n><suffix>`.
fn suffixed_candidates(dir: &Path, name: &str, suffix: &str) -> impl Iterator<Item = PathBuf> {
    let secs = unix_seconds();
    let dir = dir.to_path_buf();
    let name = name.to_string();
    let suffix = suffix.to_string();

    [
        dir.join(format!("{name}{suffix}")),
        dir.join(format!("{name}_{secs}{suffix}")),
    ]
    .into_iter()
    .chain((1u32..).map(move |n| dir.join(format!("{name}_{secs}_{n}{suffix}"))))
}

async fn first_free(candidates: impl Iterator<Item = PathBuf>) -> PathBuf {
    let mut last = PathBuf::new();
    for candidate in candidates {
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }
        last = candidate;
    }
    last
}

/// Move `from` onto the first candidate that does not exist yet.
///
/// Candidates are taken with `link(2)`, which fails instead of replacing an
/// existing file, so two moves racing for one name never clobber each other.
/// Where linking is impossible (another filesystem) the bytes are copied into
/// a file opened with `create_new`, which gives the same guarantee.
async fn move_to_free(
    from: &Path,
    candidates: impl Iterator<Item = PathBuf>,
) -> std::io::Result<PathBuf> {
    for candidate in candidates {
        let taken = match tokio::fs::hard_link(from, &candidate).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(e),
            Err(link_err) => {
                debug!(error = %link_err, "Hard link failed, copying instead");
                match copy_new(from, &candidate).await {
                    Err(e) if e.kind() != ErrorKind::AlreadyExists => return Err(link_err),
                    other => other,
                }
            }
        };

        match taken {
            Ok(()) => {
                tokio::fs::remove_file(from).await?;
                return Ok(candidate);
            }
            Err(e) => debug!(path = %candidate.display(), error = %e, "Destination taken"),
        }
    }

    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        "no free destination name",
    ))
}

/// Copy `from` into `to`, failing if `to` already exists.
async fn copy_new(from: &Path, to: &Path) -> std::io::Result<()> {
    let mut dest = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .await?;

    let copied = async {
        let mut source = tokio::fs::File::open(from).await?;
        tokio::io::copy(&mut source, &mut dest).await?;
        dest.sync_all().await
    }
    .await;

    if copied.is_err() {
        // Free the name again; the source is still in place
        let _ = tokio::fs::remove_file(to).await;
    }
    copied
}
