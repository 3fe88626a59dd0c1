//! Binary-level tests
//!
//! Every test runs `alembic` against a config rooted in a temporary directory.
//! No test reaches the network: the analyzer key variable is never set, so
//! analysis yields the processing-error record without a request.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const KEY_VAR: &str = "ALEMBIC_TEST_UNSET_API_KEY";

struct Env {
    root: TempDir,
    config: PathBuf,
}

impl Env {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config = root.path().join("config.toml");
        fs::write(
            &config,
            format!(
                "[paths]\nbase_dir = \"{}\"\n\n[llm]\napi_key_env = \"{KEY_VAR}\"\n",
                root.path().display()
            ),
        )
        .unwrap();
        Self { root, config }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("alembic").unwrap();
        cmd.current_dir(self.root.path())
            .env_remove(KEY_VAR)
            .env_remove("ALEMBIC_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config)
            .arg("--log-level")
            .arg("off");
        cmd
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|read| {
            read.map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("alembic")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("dedup"));
}

#[test]
fn test_invalid_config_exits_non_zero() {
    let env = Env::new();
    fs::write(
        &env.config,
        "[watch]\nin_progress_suffix = \".x\"\nerror_suffix = \".x\"\n",
    )
    .unwrap();

    env.cmd()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("watch.error_suffix"));
}

#[test]
fn test_missing_explicit_config_exits_non_zero() {
    let env = Env::new();
    Command::cargo_bin("alembic")
        .unwrap()
        .current_dir(env.root.path())
        .arg("--config")
        .arg(env.path("missing.toml"))
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_status_lists_stale_files() {
    let env = Env::new();
    let ingest = env.path("Chat_Ingest");
    fs::create_dir_all(&ingest).unwrap();
    fs::write(ingest.join("a.json.processing"), "{}").unwrap();
    fs::write(ingest.join("b.txt.error"), "x").unwrap();

    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.json.processing"))
        .stdout(predicate::str::contains("b.txt.error"));
}

#[test]
fn test_status_clean_directory() {
    let env = Env::new();
    fs::create_dir_all(env.path("Chat_Ingest")).unwrap();

    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No interrupted or quarantined files"));
}

#[test]
fn test_dedup_mark_then_check() {
    let env = Env::new();
    let url = "https://gemini.google.com/share/abc";

    env.cmd()
        .args(["dedup", "check", url])
        .assert()
        .success()
        .stdout(predicate::str::contains("New:"));

    env.cmd()
        .args(["dedup", "mark", url])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked:"));

    env.cmd()
        .args(["dedup", "check", url])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed:"));

    assert!(env.path("state/processed_ids.json").exists());
}

#[test]
fn test_dedup_rejects_non_url() {
    let env = Env::new();
    env.cmd()
        .args(["dedup", "mark", "hello world"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a single http(s) URL"));
}

#[test]
fn test_ingest_plain_text_without_key_writes_error_note() {
    let env = Env::new();
    let outside = env.path("chat.txt");
    fs::write(&outside, "USER: how do I read a file?\nASSISTANT: use std::fs.").unwrap();

    env.cmd()
        .arg("ingest")
        .arg(&outside)
        .assert()
        .success()
        .stdout(predicate::str::contains("Note:"));

    // Original left alone, copy archived
    assert!(outside.exists());
    assert_eq!(entries(&env.path("Chat_Ingest/archive")), vec!["chat.txt"]);

    let notes = entries(&env.path("Vault/AI Ingest"));
    assert_eq!(notes.len(), 1);
    assert!(notes[0].ends_with(" - Processing Error.md"), "{notes:?}");
    let body = fs::read_to_string(env.path("Vault/AI Ingest").join(&notes[0])).unwrap();
    assert!(body.contains("source: chat.txt"));
    assert!(body.contains(KEY_VAR));
}

#[test]
fn test_ingest_known_url_is_discarded() {
    let env = Env::new();
    let url = "https://chatgpt.com/share/known";
    env.cmd().args(["dedup", "mark", url]).assert().success();

    let link = env.path("link.txt");
    fs::write(&link, format!("{url}\n")).unwrap();

    env.cmd()
        .arg("ingest")
        .arg(&link)
        .assert()
        .success()
        .stdout(predicate::str::contains("Discarded:"));

    assert!(entries(&env.path("Chat_Ingest"))
        .iter()
        .all(|name| name == "archive"));
    assert!(entries(&env.path("Vault/AI Ingest")).is_empty());
}

#[test]
fn test_ingest_malformed_json_fails_and_quarantines() {
    let env = Env::new();
    let broken = env.path("broken.json");
    fs::write(&broken, "{ nope").unwrap();

    env.cmd()
        .arg("ingest")
        .arg(&broken)
        .assert()
        .failure()
        .stderr(predicate::str::contains("quarantined"));

    assert!(env.path("Chat_Ingest/broken.json.error").exists());
}
