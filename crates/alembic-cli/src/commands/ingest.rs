use crate::commands::watch::bootstrap_dirs;
use crate::factories;
use alembic_config::AlembicConfig;
use alembic_pipeline::JobOutcome;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Run one file through the pipeline and print how it ended.
///
/// Quarantine is reported as an error so scripts see a non-zero exit.
pub async fn execute(config: AlembicConfig, file: PathBuf) -> Result<()> {
    bootstrap_dirs(&config).await?;

    let ingest_dir = config.paths.ingest_dir();
    let path = stage_into(&ingest_dir, &file).await?;
    let pipeline = factories::create_pipeline(&config);

    let outcome = pipeline.run_job(&path).await;
    match &outcome {
        JobOutcome::Archived { note, archived } => {
            println!("{} {}", "Note:".green().bold(), note.display());
            println!("{} {}", "Archived:".dimmed(), archived.display());
        }
        JobOutcome::Discarded => {
            println!("{} nothing to analyze (empty or already processed)", "Discarded:".yellow().bold());
        }
        JobOutcome::Skipped => {
            bail!("{} is not an ingestible file (hidden or carries a job suffix)", path.display())
        }
        JobOutcome::ClaimLost => {
            bail!("{} was claimed by another process or vanished", path.display())
        }
        JobOutcome::Quarantined { error } => {
            bail!("{} quarantined: {error}", path.display())
        }
    }
    Ok(())
}

/// Copy `file` into `ingest_dir` unless it already lives there.
///
/// Refuses to overwrite a file of the same name waiting in the ingest directory.
async fn stage_into(ingest_dir: &Path, file: &Path) -> Result<PathBuf> {
    let source = tokio::fs::canonicalize(file)
        .await
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let ingest_dir = tokio::fs::canonicalize(ingest_dir)
        .await
        .with_context(|| format!("Cannot read {}", ingest_dir.display()))?;

    if source.parent() == Some(ingest_dir.as_path()) {
        return Ok(source);
    }

    let name = source
        .file_name()
        .with_context(|| format!("{} has no file name", source.display()))?;
    let target = ingest_dir.join(name);
    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        bail!("{} already exists in the ingest directory", target.display());
    }

    tokio::fs::copy(&source, &target)
        .await
        .with_context(|| format!("Failed to copy {} into {}", source.display(), ingest_dir.display()))?;
    info!(from = %source.display(), to = %target.display(), "Copied into ingest directory");
    Ok(target)
}
