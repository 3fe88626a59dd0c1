//! Watch loop
//!
//! Bridges debounced filesystem events to pipeline jobs. Each candidate event
//! spawns an independent task; duplicate events for the same file are
//! resolved by the claim race inside the pipeline.

use crate::pipeline::IngestPipeline;
use alembic_watch::{DebounceConfig, FileWatcher, NotifyWatcher, WatchConfig};
use anyhow::{Context, Result};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Watches the ingest directory and runs a job per arriving file.
pub struct IngestDispatcher {
    pipeline: Arc<IngestPipeline>,
    ingest_dir: PathBuf,
    debounce: Duration,
}

impl IngestDispatcher {
    /// Dispatcher for `ingest_dir`.
    pub fn new(pipeline: Arc<IngestPipeline>, ingest_dir: impl Into<PathBuf>, debounce: Duration) -> Self {
        Self {
            pipeline,
            ingest_dir: ingest_dir.into(),
            debounce,
        }
    }

    /// Warn about files left by earlier runs. They are never resumed.
    pub async fn report_stale(&self) -> Result<usize> {
        let stale = self
            .pipeline
            .locks()
            .stale_files(&self.ingest_dir)
            .await
            .with_context(|| format!("Failed to scan {}", self.ingest_dir.display()))?;

        for path in &stale.in_progress {
            warn!(path = %path.display(), "Stale in-progress file from an interrupted run, not resuming");
        }
        if !stale.errored.is_empty() {
            info!(count = stale.errored.len(), "Quarantined files awaiting review");
        }
        Ok(stale.in_progress.len())
    }

    /// Watch until `shutdown` resolves.
    ///
    /// Jobs still running at shutdown are aborted; their files keep the
    /// in-progress suffix.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = NotifyWatcher::new();
        watcher.set_event_sender(tx);
        let handle = watcher
            .watch(
                self.ingest_dir.clone(),
                WatchConfig::new("ingest")
                    .with_debounce(DebounceConfig::new(self.debounce.as_millis() as u64)),
            )
            .await
            .with_context(|| format!("Failed to watch {}", self.ingest_dir.display()))?;

        self.report_stale().await?;
        info!(dir = %self.ingest_dir.display(), "Watching for new files");

        let filter = self.pipeline.locks().filter().clone();
        let mut jobs = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                Some(event) = rx.recv() => {
                    let Some(path) = filter.candidate_from_event(&event) else {
                        continue;
                    };
                    info!(path = %path.display(), "Detected new file");
                    let pipeline = Arc::clone(&self.pipeline);
                    jobs.spawn(async move { pipeline.run_job(&path).await });
                }
                Some(joined) = jobs.join_next(), if !jobs.is_empty() => {
                    match joined {
                        Ok(outcome) => debug!(%outcome, "Job task finished"),
                        Err(e) if e.is_panic() => error!(error = %e, "Job task panicked"),
                        Err(_) => {}
                    }
                }
            }
        }

        if let Err(e) = watcher.unwatch(handle).await {
            debug!(error = %e, "Failed to remove watch during shutdown");
        }
        if !jobs.is_empty() {
            warn!(in_flight = jobs.len(), "Aborting in-flight jobs");
        }
        jobs.shutdown().await;
        Ok(())
    }
}
