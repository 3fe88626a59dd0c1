//! Image capture from intercepted responses

use crate::error::ExtractResult;
use alembic_core::Fingerprint;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Writes qualifying image responses into a staging `images/` directory.
///
/// Each asset is written at most once per sink, keyed by the fingerprint of
/// its response URL.
#[derive(Debug)]
pub struct AssetSink {
    images_dir: PathBuf,
    min_bytes: usize,
    noise_markers: Vec<String>,
    written: Mutex<HashSet<Fingerprint>>,
}

impl AssetSink {
    /// Sink writing into `images_dir`.
    pub fn new(images_dir: impl Into<PathBuf>, min_bytes: usize, noise_markers: Vec<String>) -> Self {
        Self {
            images_dir: images_dir.into(),
            min_bytes,
            noise_markers,
            written: Mutex::new(HashSet::new()),
        }
    }

    /// Target directory
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Whether a response is worth fetching the body of.
    pub fn should_capture(&self, url: &str, mime_type: &str) -> bool {
        mime_type.to_ascii_lowercase().starts_with("image/")
            && !self
                .noise_markers
                .iter()
                .any(|marker| url.contains(marker.as_str()))
    }

    /// Persist one response body.
    ///
    /// Returns the written path, or `None` when the body is too small to be
    /// content or the asset was already written.
    pub async fn store(
        &self,
        url: &str,
        mime_type: &str,
        body: &[u8],
    ) -> ExtractResult<Option<PathBuf>> {
        if body.len() < self.min_bytes {
            trace!(url, size = body.len(), "Skipping decorative image");
            return Ok(None);
        }

        let fingerprint = Fingerprint::of_asset(url);
        if !self.written.lock().await.insert(fingerprint.clone()) {
            return Ok(None);
        }

        let path = self
            .images_dir
            .join(format!("{fingerprint}{}", extension_for_mime(mime_type)));

        let result = async {
            tokio::fs::create_dir_all(&self.images_dir).await?;
            tokio::fs::write(&path, body).await
        }
        .await;

        if let Err(e) = result {
            self.written.lock().await.remove(&fingerprint);
            return Err(e.into());
        }

        debug!(url, path = %path.display(), size = body.len(), "Captured image");
        Ok(Some(path))
    }

    /// Number of distinct assets written so far
    pub async fn written_count(&self) -> usize {
        self.written.lock().await.len()
    }
}

/// File extension, with dot, for an image MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        _ => ".img",
    }
}
