//! Content hashing for cache-key derivation

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 digest of spec or implementation text.
///
/// Keys built by [`compute_content_hash`] hold all 64 hex characters. Keys
/// recovered from a key string only hold the truncated prefix that was
/// embedded in it.
///
/// Deserialization applies the same check as [`ContentHash::from_hex`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already-computed hex digest (or digest prefix).
    ///
    /// Returns `None` unless the value is non-empty lowercase hex.
    pub fn from_hex(hex: impl Into<String>) -> Option<Self> {
        let hex = hex.into();
        if is_lower_hex(&hex) {
            Some(Self(hex))
        } else {
            None
        }
    }

    /// The hex digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first `len` hex characters (or the whole digest if shorter).
    pub fn prefix(&self, len: usize) -> &str {
        // Hex is ASCII, so byte slicing is char slicing.
        &self.0[..len.min(self.0.len())]
    }

    /// Check whether this digest begins with the given hex prefix.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_lower_hex(&value) {
            Ok(Self(value))
        } else {
            Err(format!("Invalid ContentHash: {:?} is not lowercase hex", value))
        }
    }
}

impl From<ContentHash> for String {
    fn from(value: ContentHash) -> Self {
        value.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the SHA-256 digest of text content.
///
/// Pure and deterministic: byte-identical input gives the same digest on
/// every process and machine.
pub fn compute_content_hash(content: &str) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    ContentHash(hex::encode(hasher.finalize()))
}

pub(crate) fn is_lower_hex(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
