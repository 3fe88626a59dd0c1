//! Subscriber setup

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Pick the filter: CLI flag, then `RUST_LOG`, then the configured directive.
///
/// An unparsable directive falls back to `info`.
pub fn build_filter(cli_level: Option<LevelFilter>, rust_log: Option<&str>, configured: &str) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::default().add_directive(level.into());
    }
    let directive = rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(configured);
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global `fmt` subscriber on stderr.
pub fn init(cli_level: Option<LevelFilter>, configured: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(cli_level, rust_log.as_deref(), configured);

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
