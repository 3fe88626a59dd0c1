//! Watch loop tests against a real filesystem watcher

use alembic_core::{InMemoryDedupStore, InsightAnalyzer, InsightRecord, StagingAssets};
use alembic_extract::{ContentExtractor, ExtractError, ExtractResult, PageScraper, ScrapeOutput};
use alembic_notes::MarkdownNoteWriter;
use alembic_pipeline::{IngestDispatcher, IngestPipeline};
use alembic_watch::{CandidateFilter, JobLockManager};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;
use url::Url;

struct EchoAnalyzer;

#[async_trait]
impl InsightAnalyzer for EchoAnalyzer {
    async fn analyze(&self, conversation: &str) -> InsightRecord {
        InsightRecord {
            topic: "Watched".to_string(),
            tags: Vec::new(),
            problem_context: conversation.to_string(),
            solution_insight: String::new(),
            code_snippet: None,
            blog_post: String::new(),
        }
    }
}

struct NoScraper;

#[async_trait]
impl PageScraper for NoScraper {
    async fn scrape(&self, _url: &Url, _staging: StagingAssets) -> ExtractResult<ScrapeOutput> {
        Err(ExtractError::Browser("no browser in tests".to_string()))
    }
}

fn pipeline(root: &Path) -> Arc<IngestPipeline> {
    Arc::new(IngestPipeline::new(
        JobLockManager::new(
            CandidateFilter::default(),
            root.join("archive"),
            Duration::ZERO,
        ),
        ContentExtractor::new(
            Arc::new(InMemoryDedupStore::new()),
            Arc::new(NoScraper),
            root.join("staging"),
        ),
        Arc::new(EchoAnalyzer),
        Arc::new(MarkdownNoteWriter::new(
            root.join("vault"),
            root.join("attachments"),
            "Attachments",
        )),
    ))
}

async fn wait_for(path: &Path, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    path.exists()
}

#[tokio::test]
async fn test_report_stale_counts_in_progress_files() {
    let root = TempDir::new().unwrap();
    let ingest = root.path().join("ingest");
    fs::create_dir_all(&ingest).unwrap();
    fs::write(ingest.join("a.txt.processing"), "x").unwrap();
    fs::write(ingest.join("b.txt.error"), "x").unwrap();
    fs::write(ingest.join("c.txt"), "x").unwrap();

    let dispatcher = IngestDispatcher::new(pipeline(root.path()), &ingest, Duration::from_millis(50));

    assert_eq!(dispatcher.report_stale().await.unwrap(), 1);
    // Reporting never touches the files
    assert!(ingest.join("a.txt.processing").exists());
    assert!(ingest.join("c.txt").exists());
}

#[tokio::test]
async fn test_dropped_file_is_processed_until_shutdown() {
    let root = TempDir::new().unwrap();
    let ingest = root.path().join("ingest");
    fs::create_dir_all(&ingest).unwrap();

    let dispatcher = IngestDispatcher::new(pipeline(root.path()), &ingest, Duration::from_millis(50));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(dispatcher.run(async {
        let _ = stop_rx.await;
    }));

    // Give the watcher time to register before dropping the file
    tokio::time::sleep(Duration::from_millis(300)).await;
    fs::write(ingest.join("chat.txt"), "USER: watched?").unwrap();

    let archived = wait_for(&root.path().join("archive/chat.txt"), Duration::from_secs(10)).await;

    stop_tx.send(()).unwrap();
    task.await.unwrap().unwrap();

    assert!(archived, "file was never archived");
    assert!(!ingest.join("chat.txt").exists());
    assert_eq!(fs::read_dir(root.path().join("vault")).unwrap().count(), 1);
}

#[tokio::test]
async fn test_missing_ingest_dir_fails_to_start() {
    let root = TempDir::new().unwrap();
    let dispatcher = IngestDispatcher::new(
        pipeline(root.path()),
        root.path().join("does-not-exist"),
        Duration::from_millis(50),
    );

    let result = dispatcher.run(std::future::pending()).await;

    assert!(result.is_err());
}
