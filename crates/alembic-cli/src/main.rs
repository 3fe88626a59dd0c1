use anyhow::Result;
use clap::Parser;
use tracing::debug;

use alembic_cli::{
    cli::{Cli, Commands},
    commands, logging,
};
use alembic_config::AlembicConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Secrets such as the analyzer key may live in a local .env
    let dotenv = dotenvy::dotenv().ok();

    let config = AlembicConfig::load(cli.config.as_deref())?;
    logging::init(cli.level_override(), &config.logging.level);
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "Loaded environment file");
    }

    match cli.command {
        Some(Commands::Watch) | None => commands::watch::execute(config).await?,
        Some(Commands::Ingest { file }) => commands::ingest::execute(config, file).await?,
        Some(Commands::Status) => commands::status::execute(config).await?,
        Some(Commands::Dedup(cmd)) => commands::dedup::execute(config, cmd).await?,
    }

    Ok(())
}
