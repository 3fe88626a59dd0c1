//! Deduplication Storage
//!
//! Tracks which source URLs have already been scraped so a URL dropped twice
//! is not fetched twice.
//!
//! # Design Principles
//!
//! - **Fail open**: a lookup that cannot read the store reports "not seen"
//! - **Mark after success**: callers mark a URL only once extraction finished
//! - **Backend agnostic**: traits in core, the JSON file store lives in the
//!   extraction crate
//!
//! # Example
//!
//! ```rust
//! use alembic_core::processing::{DedupStore, InMemoryDedupStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryDedupStore::new();
//! let url = "https://chatgpt.com/share/abc";
//!
//! assert!(!store.has(url).await);
//! store.mark_processed(url).await?;
//! assert!(store.has(url).await);
//! # Ok(())
//! # }
//! ```

use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Error types for dedup storage operations
#[derive(Debug, Error)]
pub enum DedupError {
    /// Filesystem failure while persisting
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Mapping could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for dedup storage operations
pub type DedupResult<T> = Result<T, DedupError>;

/// Persisted set of fingerprints of URLs that were extracted successfully.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Whether `url` was marked before.
    ///
    /// Never fails: unreadable or corrupt state is reported as `false` so a
    /// broken store causes re-scrapes rather than lost input.
    async fn has(&self, url: &str) -> bool;

    /// Record `url` as processed. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError`] if the mark could not be made durable.
    async fn mark_processed(&self, url: &str) -> DedupResult<()>;
}

/// In-memory implementation of [`DedupStore`]
///
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryDedupStore {
    seen: Arc<RwLock<HashSet<Fingerprint>>>,
}

impl InMemoryDedupStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of marked fingerprints
    pub async fn len(&self) -> usize {
        self.seen.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.seen.read().await.is_empty()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn has(&self, url: &str) -> bool {
        self.seen.read().await.contains(&Fingerprint::of_url(url))
    }

    async fn mark_processed(&self, url: &str) -> DedupResult<()> {
        self.seen.write().await.insert(Fingerprint::of_url(url));
        Ok(())
    }
}
