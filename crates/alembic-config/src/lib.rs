//! # Alembic Configuration
//!
//! TOML configuration for the ingestion pipeline. Every field has a default, so
//! an empty or missing file yields a working setup rooted at `~/Alembic`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alembic_config::AlembicConfig;
//!
//! let config = AlembicConfig::load(None)?;
//! println!("watching {}", config.paths.ingest_dir().display());
//! # Ok::<(), alembic_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
mod config;
mod error;

pub use components::*;
pub use config::*;
pub use error::*;
