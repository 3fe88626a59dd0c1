use alembic_config::AlembicConfig;
use alembic_watch::JobLockManager;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

/// List files that need manual attention.
pub async fn execute(config: AlembicConfig) -> Result<()> {
    let ingest_dir = config.paths.ingest_dir();
    println!("Ingest directory: {}", ingest_dir.display());

    if !tokio::fs::try_exists(&ingest_dir).await.unwrap_or(false) {
        println!("{}", "Not created yet; run `alembic watch` once.".dimmed());
        return Ok(());
    }

    let stale = JobLockManager::from_config(&config)
        .stale_files(&ingest_dir)
        .await
        .with_context(|| format!("Failed to scan {}", ingest_dir.display()))?;

    if stale.is_empty() {
        println!("{}", "No interrupted or quarantined files.".green());
        return Ok(());
    }

    print_group(
        "In progress (interrupted, rename back to retry):",
        &stale.in_progress,
    );
    print_group("Quarantined (check the log, fix, rename back):", &stale.errored);
    Ok(())
}

fn print_group(title: &str, paths: &[PathBuf]) {
    if paths.is_empty() {
        return;
    }
    println!("\n{} {}", title.yellow().bold(), format!("({})", paths.len()).dimmed());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {name}");
    }
}
