//! Read-through verification.
//!
//! Couples the cache with a [`Verifier`]: look up first, run the verifier
//! only on a miss, and store what it returns.

use async_trait::async_trait;
use tiercache_core::{CacheKey, CacheResult, MissReason, VerificationReport, VerificationTier};
use tracing::debug;

use super::outcome::{LookupOutcome, StoreOptions};
use super::service::VerificationCache;
use super::traits::StorageAdapter;

/// Runs a verification of an implementation against its spec.
///
/// The returned report is stored and handed back verbatim.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Verify `request.impl_content` against `request.spec_content` at
    /// `request.tier`.
    async fn verify(&self, request: &VerificationRequest) -> CacheResult<VerificationReport>;
}

/// Input to a read-through verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub spec_content: String,
    pub impl_content: String,
    pub tier: VerificationTier,
    /// Only meaningful for [`VerificationTier::AiReview`].
    pub ai_model_version: Option<String>,
    /// Metadata recorded if the result is stored.
    pub options: StoreOptions,
}

impl VerificationRequest {
    pub fn new(
        spec_content: impl Into<String>,
        impl_content: impl Into<String>,
        tier: VerificationTier,
    ) -> Self {
        Self {
            spec_content: spec_content.into(),
            impl_content: impl_content.into(),
            tier,
            ai_model_version: None,
            options: StoreOptions::default(),
        }
    }

    pub fn with_ai_model_version(mut self, version: impl Into<String>) -> Self {
        self.ai_model_version = Some(version.into());
        self
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }
}

/// Report returned by [`VerificationCache::verify`], with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedVerification {
    /// The cached or freshly produced report.
    pub report: VerificationReport,
    /// Key the report is stored under.
    pub key: CacheKey,
    /// Why the cache missed, or `None` if the report came from the cache.
    pub miss_reason: Option<MissReason>,
}

impl CachedVerification {
    /// Check if the report was served from the cache.
    pub fn was_cache_hit(&self) -> bool {
        self.miss_reason.is_none()
    }

    /// Consume the wrapper and return the report.
    pub fn into_report(self) -> VerificationReport {
        self.report
    }
}

impl<S: StorageAdapter> VerificationCache<S> {
    /// Return the cached report for `request`, running `verifier` on a miss.
    ///
    /// A fresh report is stored with the request's [`StoreOptions`]. Verifier
    /// errors propagate and leave the cache untouched.
    pub async fn verify<V>(
        &self,
        request: &VerificationRequest,
        verifier: &V,
    ) -> CacheResult<CachedVerification>
    where
        V: Verifier + ?Sized,
    {
        let key = self.create_key(
            &request.spec_content,
            &request.impl_content,
            request.tier.clone(),
            request.ai_model_version.as_deref(),
        );

        let reason = match self.lookup(&key).await? {
            LookupOutcome::Hit(entry) => {
                return Ok(CachedVerification {
                    report: entry.result,
                    key,
                    miss_reason: None,
                });
            }
            LookupOutcome::Miss(reason) => reason,
        };

        debug!(key = %key, reason = %reason, "running verifier");
        let report = verifier.verify(request).await?;
        self.store(&key, report.clone(), request.options.clone())
            .await?;

        Ok(CachedVerification {
            report,
            key,
            miss_reason: Some(reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory_backend::InMemoryStorage;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tiercache_core::CacheError;

    #[derive(Default)]
    struct StubVerifier {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Verifier for StubVerifier {
        async fn verify(&self, request: &VerificationRequest) -> CacheResult<VerificationReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CacheError::Verifier {
                    reason: "checker crashed".to_string(),
                });
            }
            Ok(json!({"tier": request.tier.as_str(), "passed": true}))
        }
    }

    #[tokio::test]
    async fn test_verify_runs_once_then_hits() {
        let cache = VerificationCache::with_defaults(Arc::new(InMemoryStorage::new()));
        let verifier = StubVerifier::default();
        let request = VerificationRequest::new("spec", "impl", VerificationTier::Behavior);

        let first = cache.verify(&request, &verifier).await.unwrap();
        assert!(!first.was_cache_hit());
        assert_eq!(first.miss_reason, Some(MissReason::NotFound));

        let second = cache.verify(&request, &verifier).await.unwrap();
        assert!(second.was_cache_hit());
        assert_eq!(second.report, first.report);
        assert_eq!(second.key, first.key);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_verify_records_store_options() {
        let cache = VerificationCache::with_defaults(Arc::new(InMemoryStorage::new()));
        let request = VerificationRequest::new("spec", "impl", VerificationTier::Structure)
            .with_options(StoreOptions::new().with_dependency("src/dep.ts"));

        cache
            .verify(&request, &StubVerifier::default())
            .await
            .unwrap();
        assert_eq!(cache.invalidate_for_file("src/dep.ts").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_verifier_error_stores_nothing() {
        let cache = VerificationCache::with_defaults(Arc::new(InMemoryStorage::new()));
        let verifier = StubVerifier {
            fail: true,
            ..Default::default()
        };
        let request = VerificationRequest::new("spec", "impl", VerificationTier::AiReview)
            .with_ai_model_version("model-a");

        let err = cache.verify(&request, &verifier).await.unwrap_err();
        assert!(matches!(err, CacheError::Verifier { .. }));
        assert!(cache.storage().is_empty().await);
    }
}
