//! Processing state shared between extraction and orchestration

pub mod dedup;

pub use dedup::{DedupError, DedupResult, DedupStore, InMemoryDedupStore};
