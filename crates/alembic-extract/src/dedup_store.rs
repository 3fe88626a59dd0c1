//! JSON file backed dedup store
//!
//! The whole mapping lives in one small JSON object, `{"<fingerprint>": true}`.
//! Lookups read the file fresh every time so marks made by an earlier run, or
//! by hand, are honoured without a restart.

use alembic_core::{DedupError, DedupResult, DedupStore, Fingerprint};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// [`DedupStore`] persisted as a JSON object on disk.
pub struct JsonFileDedupStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles inside this process
    write_lock: Mutex<()>,
}

impl JsonFileDedupStore {
    /// Store backed by `path`; the file is created on first mark.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_mapping(&self) -> DedupResult<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&bytes)
            .map_err(|e| DedupError::Serialization(e.to_string()))?
        {
            Value::Object(map) => Ok(map),
            other => Err(DedupError::Serialization(format!(
                "expected a JSON object, found {}",
                json_type(&other)
            ))),
        }
    }

    /// Write to a sibling temp file, fsync, rename over the original, then
    /// fsync the directory so the rename itself is durable.
    async fn persist(&self, mapping: &Map<String, Value>) -> DedupResult<()> {
        let json = serde_json::to_vec_pretty(mapping)
            .map_err(|e| DedupError::Serialization(e.to_string()))?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        tokio::fs::create_dir_all(parent).await?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path).await?;
        sync_dir(parent).await?;
        Ok(())
    }
}

/// Flush a directory's entries to disk.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

/// Directories cannot be opened as files here; the rename is as durable as
/// the platform makes it.
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl DedupStore for JsonFileDedupStore {
    async fn has(&self, url: &str) -> bool {
        let fingerprint = Fingerprint::of_url(url);
        match self.read_mapping().await {
            Ok(mapping) => mapping.contains_key(fingerprint.as_str()),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Dedup store unreadable, treating URL as new"
                );
                false
            }
        }
    }

    async fn mark_processed(&self, url: &str) -> DedupResult<()> {
        let fingerprint = Fingerprint::of_url(url);
        let _guard = self.write_lock.lock().await;

        // A corrupt file is replaced rather than blocking every future mark.
        let mut mapping = match self.read_mapping().await {
            Ok(mapping) => mapping,
            Err(DedupError::Serialization(reason)) => {
                warn!(path = %self.path.display(), %reason, "Resetting corrupt dedup store");
                Map::new()
            }
            Err(e) => return Err(e),
        };

        if mapping.get(fingerprint.as_str()) == Some(&Value::Bool(true)) {
            return Ok(());
        }

        mapping.insert(fingerprint.to_string(), Value::Bool(true));
        self.persist(&mapping).await?;
        debug!(%fingerprint, "Marked URL as processed");
        Ok(())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
