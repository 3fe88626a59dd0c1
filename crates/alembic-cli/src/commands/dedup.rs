use crate::cli::DedupCommands;
use crate::factories;
use alembic_config::AlembicConfig;
use alembic_core::Fingerprint;
use alembic_extract::bare_url;
use anyhow::{Context, Result};
use colored::Colorize;

/// Execute dedup subcommand
pub async fn execute(config: AlembicConfig, cmd: DedupCommands) -> Result<()> {
    let store = factories::create_dedup_store(&config);

    match cmd {
        DedupCommands::Check { url } => {
            let url = normalize(&url)?;
            let fingerprint = Fingerprint::of_url(&url);
            if store.has(&url).await {
                println!("{} {url} ({fingerprint})", "Processed:".yellow().bold());
            } else {
                println!("{} {url} ({fingerprint})", "New:".green().bold());
            }
        }
        DedupCommands::Mark { url } => {
            let url = normalize(&url)?;
            store
                .mark_processed(&url)
                .await
                .with_context(|| format!("Failed to mark {url}"))?;
            println!(
                "{} {url} ({})",
                "Marked:".green().bold(),
                Fingerprint::of_url(&url)
            );
        }
    }
    Ok(())
}

/// The URL in the form the extractor fingerprints it.
fn normalize(raw: &str) -> Result<String> {
    let url = bare_url(raw).with_context(|| format!("'{raw}' is not a single http(s) URL"))?;
    Ok(url.as_str().to_string())
}
