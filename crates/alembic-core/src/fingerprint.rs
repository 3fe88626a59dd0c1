//! Content fingerprints
//!
//! Short SHA-256 prefixes used as dedup keys and staging directory names.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex characters kept for a source URL fingerprint
pub const URL_FINGERPRINT_LEN: usize = 16;

/// Hex characters kept for a captured asset fingerprint
pub const ASSET_FINGERPRINT_LEN: usize = 12;

/// Truncated SHA-256 hex digest identifying a scraped URL or a captured asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a source URL, after trimming surrounding whitespace
    pub fn of_url(url: &str) -> Self {
        Self::truncated(url.trim().as_bytes(), URL_FINGERPRINT_LEN)
    }

    /// Fingerprint of an asset response URL
    pub fn of_asset(url: &str) -> Self {
        Self::truncated(url.as_bytes(), ASSET_FINGERPRINT_LEN)
    }

    /// Wrap an already computed fingerprint, e.g. a key read back from disk
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Hex string form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn truncated(data: &[u8], len: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(len);
        Self(digest)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_fingerprint_is_sha256_prefix() {
        // sha256("abc") = ba7816bf8f01cfea414140de5dae2223...
        assert_eq!(Fingerprint::of_url("abc").as_str(), "ba7816bf8f01cfea");
        assert_eq!(Fingerprint::of_asset("abc").as_str(), "ba7816bf8f01");
    }

    #[test]
    fn test_url_fingerprint_ignores_surrounding_whitespace() {
        let a = Fingerprint::of_url("https://chatgpt.com/share/abc");
        let b = Fingerprint::of_url("  https://chatgpt.com/share/abc\n");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), URL_FINGERPRINT_LEN);
    }

    #[test]
    fn test_distinct_urls_differ() {
        assert_ne!(
            Fingerprint::of_url("https://claude.ai/share/1"),
            Fingerprint::of_url("https://claude.ai/share/2")
        );
    }
}
