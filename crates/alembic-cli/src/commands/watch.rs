use crate::factories;
use alembic_config::AlembicConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// Create every directory the pipeline writes to.
pub async fn bootstrap_dirs(config: &AlembicConfig) -> Result<Vec<PathBuf>> {
    let dirs = config.paths.bootstrap_dirs();
    for dir in &dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(dirs)
}

/// Run the watcher until Ctrl-C.
pub async fn execute(config: AlembicConfig) -> Result<()> {
    bootstrap_dirs(&config).await?;

    let dispatcher = factories::create_dispatcher(&config);
    info!(
        ingest = %config.paths.ingest_dir().display(),
        vault = %config.paths.vault_dir().display(),
        "Alembic watcher starting"
    );

    dispatcher
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C, stopping");
            }
        })
        .await?;

    info!("Alembic watcher stopped");
    Ok(())
}
