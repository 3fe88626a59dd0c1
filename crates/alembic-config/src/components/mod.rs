//! Configuration sections for the ingestion pipeline
//!
//! One module per `[section]` of the TOML file.

pub mod llm;
pub mod logging;
pub mod paths;
pub mod scrape;
pub mod watch;

pub use llm::*;
pub use logging::*;
pub use paths::*;
pub use scrape::*;
pub use watch::*;
