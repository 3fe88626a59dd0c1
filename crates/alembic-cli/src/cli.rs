use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Per-job status lines (default)
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "alembic")]
#[command(about = "alembic - turn dropped AI conversations into vault notes")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute (defaults to watch if not provided)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses RUST_LOG, then the config file value
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/alembic/config.toml)
    #[arg(short = 'C', long, global = true, env = "ALEMBIC_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Level requested on the command line, if any
    pub fn level_override(&self) -> Option<LevelFilter> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level.into()),
            (None, true) => Some(LevelFilter::DEBUG),
            (None, false) => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Watch the ingest directory until Ctrl-C
    Watch,

    /// Run a single file through the pipeline
    ///
    /// Files outside the ingest directory are copied in first; the original
    /// is left untouched.
    Ingest {
        /// File to ingest
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List in-progress and quarantined files
    Status,

    /// Inspect or edit the processed-URL store
    #[command(subcommand)]
    Dedup(DedupCommands),
}

#[derive(Debug, Subcommand)]
pub enum DedupCommands {
    /// Report whether a URL has already been processed
    Check {
        /// Share URL
        url: String,
    },

    /// Mark a URL as processed so future drops are discarded
    Mark {
        /// Share URL
        url: String,
    },
}
