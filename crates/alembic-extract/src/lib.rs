//! Content extraction for the Alembic ingestion pipeline.
//!
//! A claimed file is classified once into a [`SourceKind`] and normalized into
//! text: conversation exports are flattened, other JSON is pretty-printed,
//! plain text passes through and a bare share URL is scraped with headless
//! Chrome. The JSON-file [`JsonFileDedupStore`] keeps URLs from being scraped
//! twice.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dedup_store;
mod error;
mod extractor;
pub mod scrape;
mod source;
pub mod transcript;

pub use dedup_store::JsonFileDedupStore;
pub use error::{ExtractError, ExtractResult};
pub use extractor::{ContentExtractor, Extraction};
pub use scrape::{ChromeScraper, PageScraper, ScrapeOutput};
pub use source::{bare_url, SourceKind};
