//! Alembic CLI library
//!
//! Argument parsing, logging setup, the composition root that assembles the
//! pipeline from configuration, and one module per subcommand.

pub mod cli;
pub mod commands;
pub mod factories;
pub mod logging;
