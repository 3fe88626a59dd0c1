//! Vault writer

use crate::markdown::{render_note, NoteContext};
use crate::naming::{attachment_id, note_file_name, sanitize_title};
use alembic_config::PathsConfig;
use alembic_core::{InsightRecord, NoteWriter, StagingAssets};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Give up after this many ` (n)` suffixes
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// [`NoteWriter`] producing markdown notes in a vault directory.
///
/// Staged images are copied into `attachments_dir/<note id>/` and embedded
/// with vault-relative links under `link_prefix`.
#[derive(Debug, Clone)]
pub struct MarkdownNoteWriter {
    vault_dir: PathBuf,
    attachments_dir: PathBuf,
    link_prefix: String,
}

impl MarkdownNoteWriter {
    /// Writer for explicit directories.
    pub fn new(
        vault_dir: impl Into<PathBuf>,
        attachments_dir: impl Into<PathBuf>,
        link_prefix: impl Into<String>,
    ) -> Self {
        Self {
            vault_dir: vault_dir.into(),
            attachments_dir: attachments_dir.into(),
            link_prefix: link_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Writer for the configured vault.
    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self::new(
            paths.vault_dir(),
            paths.attachments_dir(),
            paths.attachment_link_prefix(),
        )
    }

    /// Directory notes are written to
    pub fn vault_dir(&self) -> &Path {
        &self.vault_dir
    }

    /// Write a note dated `date`.
    pub async fn write_note_on(
        &self,
        date: NaiveDate,
        record: &InsightRecord,
        source_name: &str,
        staging: Option<&StagingAssets>,
    ) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.vault_dir)
            .await
            .with_context(|| format!("Failed to create vault dir {}", self.vault_dir.display()))?;

        let attachments = match staging {
            Some(staging) => self.copy_attachments(date, staging).await?,
            None => Vec::new(),
        };

        let content = render_note(
            record,
            &NoteContext {
                date,
                source: source_name,
                attachments: &attachments,
            },
        );

        let title = sanitize_title(&record.topic);
        let (path, mut file) = self.create_unique(date, &title).await?;
        file.write_all(content.as_bytes())
            .await
            .with_context(|| format!("Failed to write note {}", path.display()))?;
        file.flush().await?;

        info!(path = %path.display(), attachments = attachments.len(), "Note created");
        Ok(path)
    }

    /// Claim the first free note name with `create_new`, so concurrent
    /// writers with the same topic never overwrite each other.
    async fn create_unique(
        &self,
        date: NaiveDate,
        title: &str,
    ) -> anyhow::Result<(PathBuf, tokio::fs::File)> {
        for n in 0..MAX_NAME_ATTEMPTS {
            let path = self.vault_dir.join(note_file_name(date, title, n));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create note {}", path.display()))
                }
            }
        }
        anyhow::bail!("No free note name for '{title}' in {}", self.vault_dir.display())
    }

    /// Copy staged images, sorted by name, and return their embed targets.
    async fn copy_attachments(
        &self,
        date: NaiveDate,
        staging: &StagingAssets,
    ) -> anyhow::Result<Vec<String>> {
        let images_dir = staging.images_dir();
        let mut entries = match tokio::fs::read_dir(&images_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to list {}", images_dir.display()))
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        if names.is_empty() {
            return Ok(Vec::new());
        }
        names.sort();

        let note_id = attachment_id(date);
        let target_dir = self.attachments_dir.join(&note_id);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .with_context(|| format!("Failed to create {}", target_dir.display()))?;

        let mut links = Vec::with_capacity(names.len());
        for name in names {
            tokio::fs::copy(images_dir.join(&name), target_dir.join(&name))
                .await
                .with_context(|| format!("Failed to copy attachment {name}"))?;
            links.push(format!("{}/{note_id}/{name}", self.link_prefix));
        }

        debug!(count = links.len(), dir = %target_dir.display(), "Copied attachments");
        Ok(links)
    }
}

#[async_trait]
impl NoteWriter for MarkdownNoteWriter {
    async fn write_note(
        &self,
        record: &InsightRecord,
        source_name: &str,
        staging: Option<&StagingAssets>,
    ) -> anyhow::Result<PathBuf> {
        self.write_note_on(Local::now().date_naive(), record, source_name, staging)
            .await
    }
}
