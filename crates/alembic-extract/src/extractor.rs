//! Content extraction
//!
//! Turns a claimed file into normalized text for the analyzer. URL jobs go
//! through the dedup store and the scraper; everything else is read locally.

use crate::error::ExtractResult;
use crate::scrape::PageScraper;
use crate::source::SourceKind;
use crate::transcript;
use alembic_core::{DedupStore, Fingerprint, Job, StagingAssets};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Normalized content ready for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Text handed to the analyzer
    pub text: String,
    /// Staged page and images, URL jobs only
    pub staging: Option<StagingAssets>,
    /// Source kind label, for logs
    pub kind: &'static str,
}

/// Classifies claimed files and produces their text.
pub struct ContentExtractor {
    dedup: Arc<dyn DedupStore>,
    scraper: Arc<dyn PageScraper>,
    staging_root: PathBuf,
}

impl ContentExtractor {
    /// Extractor staging scrapes under `staging_root/<url fingerprint>/`.
    pub fn new(
        dedup: Arc<dyn DedupStore>,
        scraper: Arc<dyn PageScraper>,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dedup,
            scraper,
            staging_root: staging_root.into(),
        }
    }

    /// Root of all per-URL staging directories
    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Extract the claimed file of `job`.
    ///
    /// Returns `Ok(None)` for an already processed URL or for content that is
    /// empty after trimming. A successful scrape attaches its staging
    /// directory to the job.
    pub async fn extract(&self, job: &mut Job) -> ExtractResult<Option<Extraction>> {
        let bytes = tokio::fs::read(job.locked_path()).await?;
        let extension = job.source_extension();
        let kind = SourceKind::classify(extension.as_deref(), &bytes)?;
        let label = kind.label();
        debug!(job_id = %job.id(), kind = label, "Classified source");

        let (text, staging) = match kind {
            SourceKind::Transcript(conversations) => (transcript::render(&conversations), None),
            SourceKind::Json(value) => (serde_json::to_string_pretty(&value)?, None),
            SourceKind::PlainText(text) => (text, None),
            SourceKind::Url(url) => {
                if self.dedup.has(url.as_str()).await {
                    info!(%url, "URL already processed, skipping");
                    return Ok(None);
                }

                let staging = StagingAssets::new(
                    self.staging_root
                        .join(Fingerprint::of_url(url.as_str()).as_str()),
                );
                let output = self.scraper.scrape(&url, staging).await?;
                self.dedup.mark_processed(url.as_str()).await?;
                info!(
                    %url,
                    images = output.assets_written,
                    scroll_steps = output.scroll.steps,
                    "Scraped shared conversation"
                );

                job.attach_staging(output.staging.clone());
                (output.text, Some(output.staging))
            }
        };

        if text.trim().is_empty() {
            info!(job_id = %job.id(), kind = label, "No content after extraction");
            return Ok(None);
        }

        Ok(Some(Extraction {
            text,
            staging,
            kind: label,
        }))
    }
}
