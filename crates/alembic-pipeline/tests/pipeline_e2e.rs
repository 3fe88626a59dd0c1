//! End-to-end pipeline tests
//!
//! Each test drops a file into a temporary ingest directory and runs one job
//! through the real lock manager, extractor and vault writer. The analyzer and
//! scraper are replaced with in-process fakes.

use alembic_core::{
    DedupStore, InMemoryDedupStore, InsightAnalyzer, InsightRecord, NoteWriter, StagingAssets,
};
use alembic_extract::scrape::{ScrollOutcome, ScrollStop};
use alembic_extract::{ContentExtractor, ExtractResult, PageScraper, ScrapeOutput};
use alembic_notes::MarkdownNoteWriter;
use alembic_pipeline::{IngestPipeline, JobOutcome};
use alembic_watch::{CandidateFilter, JobLockManager};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

const SHARE_URL: &str = "https://chatgpt.com/share/abc123";

// ============================================================================
// Fakes
// ============================================================================

struct CountingAnalyzer {
    calls: AtomicUsize,
    sentinel: bool,
}

#[async_trait]
impl InsightAnalyzer for CountingAnalyzer {
    async fn analyze(&self, conversation: &str) -> InsightRecord {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.sentinel {
            return InsightRecord::processing_error("HTTP error: connection refused");
        }
        InsightRecord {
            topic: "Pipeline Test".to_string(),
            tags: vec!["test".to_string()],
            problem_context: format!("{} chars", conversation.len()),
            solution_insight: "It worked.".to_string(),
            code_snippet: None,
            blog_post: "Draft.".to_string(),
        }
    }
}

struct FailingWriter {
    calls: AtomicUsize,
}

#[async_trait]
impl NoteWriter for FailingWriter {
    async fn write_note(
        &self,
        _record: &InsightRecord,
        _source_name: &str,
        _staging: Option<&StagingAssets>,
    ) -> anyhow::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("vault is read-only")
    }
}

/// Writes the page text and one image, like a real scrape would.
struct StubScraper {
    calls: AtomicUsize,
}

#[async_trait]
impl PageScraper for StubScraper {
    async fn scrape(&self, url: &Url, staging: StagingAssets) -> ExtractResult<ScrapeOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::create_dir_all(staging.images_dir()).await?;
        tokio::fs::write(staging.images_dir().join("0123456789ab.png"), b"png").await?;
        let text = format!("TITLE: Shared chat\nURL: {url}\n\nUSER: how do I lock files?");
        tokio::fs::write(staging.page_path(), &text).await?;
        Ok(ScrapeOutput {
            text,
            staging,
            assets_written: 1,
            scroll: ScrollOutcome {
                steps: 3,
                final_height: 1200,
                stop: ScrollStop::Stable,
            },
        })
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    root: TempDir,
    dedup: InMemoryDedupStore,
    analyzer: Arc<CountingAnalyzer>,
    scraper: Arc<StubScraper>,
    pipeline: IngestPipeline,
}

impl Fixture {
    fn new() -> Self {
        Self::build(false, None)
    }

    fn build(sentinel: bool, writer: Option<Arc<dyn NoteWriter>>) -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("ingest")).unwrap();

        let dedup = InMemoryDedupStore::new();
        let analyzer = Arc::new(CountingAnalyzer {
            calls: AtomicUsize::new(0),
            sentinel,
        });
        let scraper = Arc::new(StubScraper {
            calls: AtomicUsize::new(0),
        });
        let writer = writer.unwrap_or_else(|| {
            Arc::new(MarkdownNoteWriter::new(
                root.path().join("vault"),
                root.path().join("attachments"),
                "Resources/AI_Attachments",
            ))
        });

        let pipeline = IngestPipeline::new(
            JobLockManager::new(
                CandidateFilter::default(),
                root.path().join("archive"),
                Duration::ZERO,
            ),
            ContentExtractor::new(
                Arc::new(dedup.clone()),
                scraper.clone(),
                root.path().join("staging"),
            ),
            analyzer.clone(),
            writer,
        );

        Self {
            root,
            dedup,
            analyzer,
            scraper,
            pipeline,
        }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn drop_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path("ingest").join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn ingest_entries(&self) -> Vec<String> {
        entries(&self.path("ingest"))
    }

    fn analyzer_calls(&self) -> usize {
        self.analyzer.calls.load(Ordering::SeqCst)
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Happy paths
// ============================================================================

#[tokio::test]
async fn test_plain_text_is_archived_with_note() {
    let fx = Fixture::new();
    let source = fx.drop_file("note.txt", "USER: why is my build slow?\nASSISTANT: cache it.");

    let outcome = fx.pipeline.run_job(&source).await;

    let JobOutcome::Archived { note, archived } = outcome else {
        panic!("expected archive, got {outcome:?}");
    };
    assert_eq!(archived, fx.path("archive/note.txt"));
    assert_eq!(
        fs::read_to_string(&archived).unwrap(),
        "USER: why is my build slow?\nASSISTANT: cache it."
    );
    assert!(note.starts_with(fx.path("vault")));
    let body = fs::read_to_string(&note).unwrap();
    assert!(body.contains("source: note.txt\n"));
    assert!(body.contains("# Pipeline Test\n"));

    assert!(fx.ingest_entries().is_empty());
    assert!(!fx.path("staging").exists());
    assert_eq!(fx.analyzer_calls(), 1);
}

#[tokio::test]
async fn test_transcript_export_is_flattened_before_analysis() {
    let fx = Fixture::new();
    let export = r#"[{"mapping": {
        "b": {"message": {"author": {"role": "assistant"}, "create_time": 2.0,
              "content": {"parts": ["Use a rename lock."]}}},
        "a": {"message": {"author": {"role": "user"}, "create_time": 1.0,
              "content": {"parts": ["How do I avoid double processing?"]}}}
    }}]"#;
    let source = fx.drop_file("conversations.json", export);

    let outcome = fx.pipeline.run_job(&source).await;

    assert!(matches!(outcome, JobOutcome::Archived { .. }), "{outcome:?}");
    assert!(fx.path("archive/conversations.json").exists());
    assert_eq!(fx.analyzer_calls(), 1);
}

#[tokio::test]
async fn test_new_url_is_scraped_marked_and_images_attached() {
    let fx = Fixture::new();
    let source = fx.drop_file("link.txt", &format!("  {SHARE_URL}\n"));

    let outcome = fx.pipeline.run_job(&source).await;

    let JobOutcome::Archived { note, .. } = outcome else {
        panic!("expected archive, got {outcome:?}");
    };
    assert_eq!(fx.scraper.calls.load(Ordering::SeqCst), 1);
    assert!(fx.dedup.has(SHARE_URL).await);

    let body = fs::read_to_string(note).unwrap();
    assert!(body.contains("## Attachments\n![[Resources/AI_Attachments/"));
    assert!(body.contains("/0123456789ab.png]]"));

    // Staging is kept for inspection
    let staged = entries(&fx.path("staging"));
    assert_eq!(staged.len(), 1);
    assert!(fx.path("staging").join(&staged[0]).join("page.txt").exists());
}

#[tokio::test]
async fn test_archive_name_collision_keeps_both() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.path("archive")).unwrap();
    fs::write(fx.path("archive/note.txt"), "older").unwrap();
    let source = fx.drop_file("note.txt", "newer conversation");

    let outcome = fx.pipeline.run_job(&source).await;

    let JobOutcome::Archived { archived, .. } = outcome else {
        panic!("expected archive, got {outcome:?}");
    };
    assert_ne!(archived, fx.path("archive/note.txt"));
    let name = archived.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("note_") && name.ends_with(".txt"), "{name}");
    assert_eq!(fs::read_to_string(fx.path("archive/note.txt")).unwrap(), "older");
}

// ============================================================================
// Soft misses
// ============================================================================

#[tokio::test]
async fn test_known_url_is_discarded_without_analysis() {
    let fx = Fixture::new();
    fx.dedup.mark_processed(SHARE_URL).await.unwrap();
    let source = fx.drop_file("link.txt", SHARE_URL);

    let outcome = fx.pipeline.run_job(&source).await;

    assert_eq!(outcome, JobOutcome::Discarded);
    assert!(fx.ingest_entries().is_empty());
    assert!(!fx.path("archive").exists());
    assert!(!fx.path("vault").exists());
    assert_eq!(fx.scraper.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.analyzer_calls(), 0);
}

#[tokio::test]
async fn test_blank_file_is_discarded() {
    let fx = Fixture::new();
    let source = fx.drop_file("empty.txt", " \n\t\n");

    let outcome = fx.pipeline.run_job(&source).await;

    assert_eq!(outcome, JobOutcome::Discarded);
    assert!(fx.ingest_entries().is_empty());
    assert_eq!(fx.analyzer_calls(), 0);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_analyzer_sentinel_still_produces_note() {
    let fx = Fixture::build(true, None);
    let source = fx.drop_file("chat.txt", "USER: hello");

    let outcome = fx.pipeline.run_job(&source).await;

    let JobOutcome::Archived { note, archived } = outcome else {
        panic!("expected archive, got {outcome:?}");
    };
    assert!(archived.exists());
    assert!(note
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with(" - Processing Error.md"));
    let body = fs::read_to_string(note).unwrap();
    assert!(body.contains("tags: [error, automation]"));
    assert!(body.contains("connection refused"));
}

#[tokio::test]
async fn test_writer_failure_quarantines_source() {
    let writer = Arc::new(FailingWriter {
        calls: AtomicUsize::new(0),
    });
    let fx = Fixture::build(false, Some(writer.clone()));
    let source = fx.drop_file("chat.txt", "USER: hello");

    let outcome = fx.pipeline.run_job(&source).await;

    let JobOutcome::Quarantined { error } = outcome else {
        panic!("expected quarantine, got {outcome:?}");
    };
    assert!(error.contains("Failed to write note for 'chat.txt'"), "{error}");
    assert!(error.contains("vault is read-only"), "{error}");
    assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fx.ingest_entries(), vec!["chat.txt.error".to_string()]);
    assert!(!fx.path("archive").exists());
}

#[tokio::test]
async fn test_malformed_json_is_quarantined() {
    let fx = Fixture::new();
    let source = fx.drop_file("broken.json", "{ not json");

    let outcome = fx.pipeline.run_job(&source).await;

    let JobOutcome::Quarantined { error } = outcome else {
        panic!("expected quarantine, got {outcome:?}");
    };
    assert!(error.starts_with("Extraction failed for 'broken.json'"), "{error}");
    assert_eq!(fx.ingest_entries(), vec!["broken.json.error".to_string()]);
    assert_eq!(fx.analyzer_calls(), 0);
}

#[tokio::test]
async fn test_repeat_failures_do_not_overwrite_quarantine() {
    let writer = Arc::new(FailingWriter {
        calls: AtomicUsize::new(0),
    });
    let fx = Fixture::build(false, Some(writer));

    let first = fx.drop_file("chat.txt", "first");
    assert!(matches!(fx.pipeline.run_job(&first).await, JobOutcome::Quarantined { .. }));
    let second = fx.drop_file("chat.txt", "second");
    assert!(matches!(fx.pipeline.run_job(&second).await, JobOutcome::Quarantined { .. }));

    let names = fx.ingest_entries();
    assert_eq!(names.len(), 2, "{names:?}");
    assert!(names.iter().all(|n| n.ends_with(".error")));
    assert_eq!(fs::read_to_string(fx.path("ingest/chat.txt.error")).unwrap(), "first");
}

// ============================================================================
// Claiming
// ============================================================================

#[tokio::test]
async fn test_missing_file_is_claim_lost() {
    let fx = Fixture::new();

    let outcome = fx.pipeline.run_job(&fx.path("ingest/vanished.txt")).await;

    assert_eq!(outcome, JobOutcome::ClaimLost);
    assert_eq!(fx.analyzer_calls(), 0);
}

#[tokio::test]
async fn test_duplicate_events_process_file_once() {
    let fx = Fixture::new();
    let source = fx.drop_file("chat.txt", "USER: hello");

    let (a, b) = tokio::join!(fx.pipeline.run_job(&source), fx.pipeline.run_job(&source));

    let archived = [&a, &b]
        .iter()
        .filter(|o| matches!(o, JobOutcome::Archived { .. }))
        .count();
    assert_eq!(archived, 1, "{a:?} / {b:?}");
    assert!([&a, &b].contains(&&JobOutcome::ClaimLost));
    assert_eq!(fx.analyzer_calls(), 1);
    assert_eq!(entries(&fx.path("vault")).len(), 1);
}

#[tokio::test]
async fn test_non_candidates_are_skipped_untouched() {
    let fx = Fixture::new();
    let hidden = fx.drop_file(".DS_Store", "x");
    let locked = fx.drop_file("chat.txt.processing", "x");
    let errored = fx.drop_file("chat.txt.error", "x");
    fs::create_dir_all(fx.path("ingest/subdir")).unwrap();

    for path in [&hidden, &locked, &errored, &fx.path("ingest/subdir")] {
        assert_eq!(fx.pipeline.run_job(path).await, JobOutcome::Skipped, "{}", path.display());
    }

    assert!(hidden.exists() && locked.exists() && errored.exists());
    assert_eq!(fx.analyzer_calls(), 0);
}
