//! Shared-conversation scraping
//!
//! [`PageScraper`] is the seam between the extractor and the browser. The
//! production implementation is [`ChromeScraper`]; tests substitute fakes that
//! write a staging directory without a browser.

mod assets;
mod rules;
mod scroll;
mod session;

pub use assets::{extension_for_mime, AssetSink};
pub use rules::{Platform, ScrapingRules, ELEMENT_SEPARATOR};
pub use scroll::{adaptive_scroll, ScrollOutcome, ScrollPolicy, ScrollStop, ScrollSurface};
pub use session::{BrowserHost, ChromeScraper, ScrapeSession};

use crate::error::ExtractResult;
use alembic_core::StagingAssets;
use async_trait::async_trait;
use url::Url;

/// Result of one scrape.
#[derive(Debug, Clone)]
pub struct ScrapeOutput {
    /// Contents written to `page.txt`, header included
    pub text: String,
    /// Staging directory holding `page.txt` and `images/`
    pub staging: StagingAssets,
    /// Images written during the scrape
    pub assets_written: usize,
    /// How the scroll loop ended
    pub scroll: ScrollOutcome,
}

/// Loads a shared conversation page and stages its text and images.
#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Scrape `url` into `staging`.
    ///
    /// Navigation and selector problems are tolerated; failing to open the
    /// page or to persist the harvested text is an error.
    async fn scrape(&self, url: &Url, staging: StagingAssets) -> ExtractResult<ScrapeOutput>;
}
