//! Structured cache keys and their canonical string form.
//!
//! A [`CacheKey`] identifies one verification result: which spec, which
//! implementation, which tier, and (for AI review only) which model. The
//! string form is what storage adapters index by.
//!
//! # String Format
//!
//! ```text
//! v1|spec:<16 hex>|impl:<16 hex>|tier:<tier>[|model:<model version>]
//! ```
//!
//! - The leading `v1` tag names the key schema. Keys without a tag are read
//!   as the untagged legacy layout; any other tag is rejected.
//! - Hashes are truncated to [`HASH_PREFIX_LEN`] hex characters.
//! - `model` is always the last segment, so a model version may itself
//!   contain `|`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::ContentHash;
use crate::VerificationTier;

/// Number of hex characters of each content hash embedded in a key string.
pub const HASH_PREFIX_LEN: usize = 16;

/// Schema tag written at the front of every key string.
pub const KEY_SCHEMA_VERSION: &str = "v1";

const SEGMENT_SEPARATOR: char = '|';

/// Immutable key identifying a cached verification result.
///
/// Equality is field-by-field on the hashes, tier and model version. The
/// cache never compares content, only digests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    spec_hash: ContentHash,
    impl_hash: ContentHash,
    tier: VerificationTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ai_model_version: Option<String>,
}

impl CacheKey {
    /// Create a key from precomputed hashes.
    ///
    /// The model version is kept only for [`VerificationTier::AiReview`];
    /// every other tier is model-independent and drops it.
    pub fn new(
        spec_hash: ContentHash,
        impl_hash: ContentHash,
        tier: VerificationTier,
        ai_model_version: Option<String>,
    ) -> Self {
        let ai_model_version = if tier.is_ai_review() {
            ai_model_version
        } else {
            None
        };
        Self {
            spec_hash,
            impl_hash,
            tier,
            ai_model_version,
        }
    }

    pub fn spec_hash(&self) -> &ContentHash {
        &self.spec_hash
    }

    pub fn impl_hash(&self) -> &ContentHash {
        &self.impl_hash
    }

    pub fn tier(&self) -> &VerificationTier {
        &self.tier
    }

    pub fn ai_model_version(&self) -> Option<&str> {
        self.ai_model_version.as_deref()
    }

    /// Encode this key to its canonical string form.
    ///
    /// Deterministic: the same key always yields the same string.
    pub fn encode(&self) -> String {
        let mut encoded = format!(
            "{}{sep}spec:{}{sep}impl:{}{sep}tier:{}",
            KEY_SCHEMA_VERSION,
            self.spec_hash.prefix(HASH_PREFIX_LEN),
            self.impl_hash.prefix(HASH_PREFIX_LEN),
            self.tier,
            sep = SEGMENT_SEPARATOR,
        );
        if let Some(model) = &self.ai_model_version {
            encoded.push(SEGMENT_SEPARATOR);
            encoded.push_str("model:");
            encoded.push_str(model);
        }
        encoded
    }

    /// Decode a key string.
    ///
    /// Returns `None` if:
    /// - The schema tag is present but unknown
    /// - Any of the `spec`, `impl` or `tier` segments is missing, out of
    ///   order, or has an empty/non-hex value
    /// - A trailing segment is present that is not `model:`
    ///
    /// Never panics; this runs speculatively over every stored key.
    pub fn decode(encoded: &str) -> Option<Self> {
        let body = match encoded.split_once(SEGMENT_SEPARATOR) {
            Some((tag, rest)) if !tag.contains(':') => {
                if tag != KEY_SCHEMA_VERSION {
                    return None;
                }
                rest
            }
            _ => encoded,
        };

        let mut segments = body.splitn(4, SEGMENT_SEPARATOR);
        let spec = segment_value(segments.next()?, "spec")?;
        let implementation = segment_value(segments.next()?, "impl")?;
        let tier = segment_value(segments.next()?, "tier")?;
        let model = match segments.next() {
            Some(rest) => Some(segment_value(rest, "model")?.to_string()),
            None => None,
        };

        let tier: VerificationTier = tier.parse().ok()?;

        Some(Self::new(
            ContentHash::from_hex(spec)?,
            ContentHash::from_hex(implementation)?,
            tier,
            model,
        ))
    }

    /// Compare two keys on what the string form preserves: truncated hashes,
    /// tier and model version.
    pub fn matches_encoded(&self, other: &CacheKey) -> bool {
        self.spec_hash.prefix(HASH_PREFIX_LEN) == other.spec_hash.prefix(HASH_PREFIX_LEN)
            && self.impl_hash.prefix(HASH_PREFIX_LEN) == other.impl_hash.prefix(HASH_PREFIX_LEN)
            && self.tier == other.tier
            && self.ai_model_version == other.ai_model_version
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Strip `name:` from a segment, rejecting empty values.
fn segment_value<'a>(segment: &'a str, name: &str) -> Option<&'a str> {
    let (prefix, value) = segment.split_once(':')?;
    if prefix != name || value.is_empty() {
        return None;
    }
    Some(value)
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::compute_content_hash;
    use proptest::prelude::*;

    fn tier_strategy() -> impl Strategy<Value = VerificationTier> {
        prop_oneof![
            Just(VerificationTier::Structure),
            Just(VerificationTier::Behavior),
            Just(VerificationTier::AiReview),
            "custom_[a-z]{1,8}"
                .prop_filter_map("valid custom tier", |name| VerificationTier::custom(&name)),
        ]
    }

    fn key_strategy() -> impl Strategy<Value = CacheKey> {
        (
            ".*",
            ".*",
            tier_strategy(),
            proptest::option::of("[a-zA-Z0-9.:|-]{1,24}"),
        )
            .prop_map(|(spec, implementation, tier, model)| {
                CacheKey::new(
                    compute_content_hash(&spec),
                    compute_content_hash(&implementation),
                    tier,
                    model,
                )
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Property: decode(encode(k)) agrees with k on every preserved field.
        #[test]
        fn prop_encode_decode_roundtrip(key in key_strategy()) {
            let decoded = CacheKey::decode(&key.encode());
            prop_assert!(decoded.is_some(), "Decode should succeed for valid key");
            let decoded = decoded.expect("decode should succeed");
            prop_assert!(key.matches_encoded(&decoded));
            prop_assert_eq!(decoded.encode(), key.encode());
        }

        /// Property: encoding is deterministic.
        #[test]
        fn prop_encode_is_deterministic(key in key_strategy()) {
            prop_assert_eq!(key.encode(), key.clone().encode());
        }

        /// Property: decode never panics on arbitrary input.
        #[test]
        fn prop_decode_never_panics(input in ".*") {
            let _ = CacheKey::decode(&input);
        }
    }
}
