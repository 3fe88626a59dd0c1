//! Pipeline factory

use alembic_config::AlembicConfig;
use alembic_core::{DedupStore, InsightAnalyzer, NoteWriter};
use alembic_extract::{ChromeScraper, ContentExtractor, JsonFileDedupStore, PageScraper};
use alembic_llm::ChatInsightAnalyzer;
use alembic_notes::MarkdownNoteWriter;
use alembic_pipeline::{IngestDispatcher, IngestPipeline};
use alembic_watch::JobLockManager;
use std::sync::Arc;
use tracing::debug;

/// Dedup store backed by the configured JSON file
pub fn create_dedup_store(config: &AlembicConfig) -> Arc<dyn DedupStore> {
    Arc::new(JsonFileDedupStore::new(config.paths.dedup_file()))
}

/// Build the production pipeline.
///
/// Nothing here touches the network or launches a browser; the scraper starts
/// Chrome on first use and the analyzer reads its key per request.
pub fn create_pipeline(config: &AlembicConfig) -> IngestPipeline {
    let scraper: Arc<dyn PageScraper> = Arc::new(ChromeScraper::new(config.scrape.clone()));
    let extractor = ContentExtractor::new(
        create_dedup_store(config),
        scraper,
        config.paths.staging_dir(),
    );
    let analyzer: Arc<dyn InsightAnalyzer> = Arc::new(ChatInsightAnalyzer::from_config(&config.llm));
    let writer: Arc<dyn NoteWriter> = Arc::new(MarkdownNoteWriter::from_paths(&config.paths));

    debug!(
        ingest = %config.paths.ingest_dir().display(),
        vault = %config.paths.vault_dir().display(),
        "Pipeline assembled"
    );

    IngestPipeline::new(
        JobLockManager::from_config(config),
        extractor,
        analyzer,
        writer,
    )
}

/// Build the watch loop around a fresh pipeline
pub fn create_dispatcher(config: &AlembicConfig) -> IngestDispatcher {
    IngestDispatcher::new(
        Arc::new(create_pipeline(config)),
        config.paths.ingest_dir(),
        config.watch.debounce(),
    )
}
