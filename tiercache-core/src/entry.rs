//! Persisted cache records

use serde::{Deserialize, Serialize};

use crate::{CacheKey, Timestamp};

/// Opaque payload produced by a verifier.
///
/// The cache stores and returns it verbatim and never looks inside.
pub type VerificationReport = serde_json::Value;

/// Bookkeeping stored next to every cached report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub created_at: Timestamp,
    /// `created_at + tier TTL`. Never extended after creation.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    /// Files whose change invalidates this entry.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub spec_name: Option<String>,
    #[serde(default)]
    pub impl_path: Option<String>,
}

impl EntryMeta {
    /// Whether the entry has expired as of `now`.
    ///
    /// Expiry is strict: an entry is still fresh at exactly `expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Whether this entry was recorded against `file_path`, either as a
    /// dependency or as the verified spec/implementation itself.
    pub fn references_file(&self, file_path: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == file_path)
            || self.spec_name.as_deref() == Some(file_path)
            || self.impl_path.as_deref() == Some(file_path)
    }
}

/// A cached verification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub result: VerificationReport,
    pub meta: EntryMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute_content_hash, VerificationTier};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn meta() -> EntryMeta {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        EntryMeta {
            created_at,
            expires_at: Some(created_at + Duration::hours(1)),
            dependencies: vec!["src/foo.ts".to_string(), "src/bar.ts".to_string()],
            spec_name: Some("specs/login.md".to_string()),
            impl_path: Some("src/login.ts".to_string()),
        }
    }

    #[test]
    fn test_expiry_is_strict() {
        let meta = meta();
        let expires_at = meta.expires_at.unwrap();
        assert!(!meta.is_expired_at(expires_at));
        assert!(meta.is_expired_at(expires_at + Duration::milliseconds(1)));
        assert!(!meta.is_expired_at(meta.created_at));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let meta = EntryMeta {
            expires_at: None,
            ..meta()
        };
        assert!(!meta.is_expired_at(meta.created_at + Duration::days(3650)));
    }

    #[test]
    fn test_references_file() {
        let meta = meta();
        assert!(meta.references_file("src/foo.ts"));
        assert!(meta.references_file("specs/login.md"));
        assert!(meta.references_file("src/login.ts"));
        assert!(!meta.references_file("src/other.ts"));
        assert!(!meta.references_file("src/foo"));
    }

    #[test]
    fn test_entry_serde_preserves_report_verbatim() {
        let entry = CacheEntry {
            key: CacheKey::new(
                compute_content_hash("spec"),
                compute_content_hash("impl"),
                VerificationTier::Structure,
                None,
            ),
            result: json!({"passed": true, "findings": [{"rule": "R1", "ok": false}]}),
            meta: meta(),
        };
        let bytes = serde_json::to_vec(&entry).unwrap();
        let back: CacheEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_entry_with_non_hex_hash_fails_to_deserialize() {
        let mut value = serde_json::to_value(CacheEntry {
            key: CacheKey::new(
                compute_content_hash("spec"),
                compute_content_hash("impl"),
                VerificationTier::Structure,
                None,
            ),
            result: json!(null),
            meta: meta(),
        })
        .unwrap();
        value["key"]["spec_hash"] = json!("ééééééééééééééééé");

        assert!(serde_json::from_value::<CacheEntry>(value).is_err());
    }

    #[test]
    fn test_entry_with_unencodable_tier_fails_to_deserialize() {
        let mut value = serde_json::to_value(CacheEntry {
            key: CacheKey::new(
                compute_content_hash("spec"),
                compute_content_hash("impl"),
                VerificationTier::Structure,
                None,
            ),
            result: json!(null),
            meta: meta(),
        })
        .unwrap();
        value["key"]["tier"] = json!("lint|strict");

        assert!(serde_json::from_value::<CacheEntry>(value).is_err());
    }

    #[test]
    fn test_meta_defaults_for_missing_fields() {
        let meta: EntryMeta =
            serde_json::from_str(r#"{"created_at":"2024-01-01T00:00:00Z"}"#).unwrap();
        assert!(meta.expires_at.is_none());
        assert!(meta.dependencies.is_empty());
        assert!(meta.spec_name.is_none());
    }
}
