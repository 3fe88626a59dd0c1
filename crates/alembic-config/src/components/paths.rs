//! Filesystem layout configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name used under the home directory when no base is configured
const DEFAULT_BASE_DIR_NAME: &str = "Alembic";

/// Where dropped files, archived sources, staged scrapes and notes live.
///
/// Every path is optional. Unset paths are derived from `base_dir`, relative
/// paths are resolved against it and a leading `~/` expands to the home
/// directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Root for all derived paths (default: `~/Alembic`)
    pub base_dir: Option<PathBuf>,
    /// Watched drop directory (default: `<base>/Chat_Ingest`)
    pub ingest_dir: Option<PathBuf>,
    /// Completed sources (default: `<ingest>/archive`)
    pub archive_dir: Option<PathBuf>,
    /// Per-URL scrape scratch space (default: `<base>/state/scraped`)
    pub staging_dir: Option<PathBuf>,
    /// Note output directory (default: `<base>/Vault/AI Ingest`)
    pub vault_dir: Option<PathBuf>,
    /// Copied note attachments (default: `<base>/Vault/Resources/AI_Attachments`)
    pub attachments_dir: Option<PathBuf>,
    /// Dedup mapping file (default: `<base>/state/processed_ids.json`)
    pub dedup_file: Option<PathBuf>,
    /// Vault-relative prefix used in attachment embeds
    pub attachment_link_prefix: Option<String>,
}

impl PathsConfig {
    /// Create a layout rooted at `base` with every other path derived
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base.into()),
            ..Self::default()
        }
    }

    /// Resolved base directory
    pub fn base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => expand_home(dir),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_BASE_DIR_NAME),
        }
    }

    /// Watched drop directory
    pub fn ingest_dir(&self) -> PathBuf {
        self.resolve(self.ingest_dir.as_deref(), || self.base_dir().join("Chat_Ingest"))
    }

    /// Archive directory for completed sources
    pub fn archive_dir(&self) -> PathBuf {
        self.resolve(self.archive_dir.as_deref(), || self.ingest_dir().join("archive"))
    }

    /// Staging root; each scraped URL gets a subdirectory named by its fingerprint
    pub fn staging_dir(&self) -> PathBuf {
        self.resolve(self.staging_dir.as_deref(), || {
            self.base_dir().join("state").join("scraped")
        })
    }

    /// Note output directory
    pub fn vault_dir(&self) -> PathBuf {
        self.resolve(self.vault_dir.as_deref(), || {
            self.base_dir().join("Vault").join("AI Ingest")
        })
    }

    /// Attachment root
    pub fn attachments_dir(&self) -> PathBuf {
        self.resolve(self.attachments_dir.as_deref(), || {
            self.base_dir()
                .join("Vault")
                .join("Resources")
                .join("AI_Attachments")
        })
    }

    /// Dedup state file
    pub fn dedup_file(&self) -> PathBuf {
        self.resolve(self.dedup_file.as_deref(), || {
            self.base_dir().join("state").join("processed_ids.json")
        })
    }

    /// Prefix for `![[...]]` attachment embeds
    pub fn attachment_link_prefix(&self) -> String {
        self.attachment_link_prefix
            .clone()
            .unwrap_or_else(|| "Resources/AI_Attachments".to_string())
    }

    /// Directories the watcher expects to exist before it starts
    pub fn bootstrap_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.ingest_dir(),
            self.archive_dir(),
            self.vault_dir(),
            self.attachments_dir(),
        ]
    }

    fn resolve(&self, explicit: Option<&Path>, default: impl FnOnce() -> PathBuf) -> PathBuf {
        match explicit {
            Some(path) => {
                let path = expand_home(path);
                if path.is_absolute() {
                    path
                } else {
                    self.base_dir().join(path)
                }
            }
            None => default(),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_base() {
        let paths = PathsConfig::rooted_at("/srv/alembic");

        assert_eq!(paths.ingest_dir(), PathBuf::from("/srv/alembic/Chat_Ingest"));
        assert_eq!(
            paths.archive_dir(),
            PathBuf::from("/srv/alembic/Chat_Ingest/archive")
        );
        assert_eq!(
            paths.dedup_file(),
            PathBuf::from("/srv/alembic/state/processed_ids.json")
        );
        assert_eq!(paths.attachment_link_prefix(), "Resources/AI_Attachments");
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let paths = PathsConfig {
            ingest_dir: Some(PathBuf::from("drop")),
            vault_dir: Some(PathBuf::from("/notes")),
            ..PathsConfig::rooted_at("/srv/alembic")
        };

        assert_eq!(paths.ingest_dir(), PathBuf::from("/srv/alembic/drop"));
        assert_eq!(paths.archive_dir(), PathBuf::from("/srv/alembic/drop/archive"));
        assert_eq!(paths.vault_dir(), PathBuf::from("/notes"));
    }

    #[test]
    fn test_home_expansion() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let paths = PathsConfig::rooted_at("~/brain");
        assert_eq!(paths.base_dir(), home.join("brain"));
    }
}
