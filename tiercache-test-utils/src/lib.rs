//! tiercache Test Utilities
//!
//! Shared test infrastructure for the tiercache workspace:
//! - Mock adapters and verifiers
//! - Proptest generators for keys, tiers and entries
//! - Test fixtures for common scenarios
//! - Custom assertions for lookup outcomes

pub use tiercache_core::{
    compute_content_hash, CacheConfig, CacheEntry, CacheError, CacheKey, CacheResult, ContentHash,
    EntryMeta, ManualClock, MissReason, StorageError, Timestamp, VerificationReport,
    VerificationTier,
};
pub use tiercache_storage::{
    InMemoryStorage, LookupOutcome, StorageAdapter, StoreOptions, VerificationCache,
    VerificationRequest, Verifier,
};

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// TRACING
// ============================================================================

/// Install a fmt subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; defaults to debug output from the storage crate. Safe
/// to call from every test.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tiercache_storage=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// MOCK ADAPTERS AND VERIFIERS
// ============================================================================

/// Adapter operations that [`FailingStorage`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterOp {
    Get,
    Set,
    Delete,
    Keys,
    Clear,
}

impl AdapterOp {
    fn name(self) -> &'static str {
        match self {
            AdapterOp::Get => "get",
            AdapterOp::Set => "set",
            AdapterOp::Delete => "delete",
            AdapterOp::Keys => "keys",
            AdapterOp::Clear => "clear",
        }
    }
}

/// In-memory adapter that fails the selected operations with a backend error.
///
/// Operations not selected are served by an inner [`InMemoryStorage`].
#[derive(Debug, Default)]
pub struct FailingStorage {
    inner: InMemoryStorage,
    fail_on: Vec<AdapterOp>,
}

impl FailingStorage {
    /// Fail every operation.
    pub fn always() -> Self {
        Self::failing_on([
            AdapterOp::Get,
            AdapterOp::Set,
            AdapterOp::Delete,
            AdapterOp::Keys,
            AdapterOp::Clear,
        ])
    }

    /// Fail only the given operations.
    pub fn failing_on(ops: impl IntoIterator<Item = AdapterOp>) -> Self {
        Self {
            inner: InMemoryStorage::new(),
            fail_on: ops.into_iter().collect(),
        }
    }

    /// The error returned for a failing operation.
    pub fn error_for(op: AdapterOp) -> CacheError {
        CacheError::Storage(StorageError::Backend {
            operation: op.name().to_string(),
            reason: "injected failure".to_string(),
        })
    }

    /// Access the backing store, bypassing injected failures.
    pub fn inner(&self) -> &InMemoryStorage {
        &self.inner
    }

    fn check(&self, op: AdapterOp) -> CacheResult<()> {
        if self.fail_on.contains(&op) {
            Err(Self::error_for(op))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageAdapter for FailingStorage {
    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        self.check(AdapterOp::Get)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> CacheResult<()> {
        self.check(AdapterOp::Set)?;
        self.inner.set(key, entry).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check(AdapterOp::Delete)?;
        self.inner.delete(key).await
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        self.check(AdapterOp::Keys)?;
        self.inner.keys().await
    }

    async fn clear(&self) -> CacheResult<()> {
        self.check(AdapterOp::Clear)?;
        self.inner.clear().await
    }
}

/// Verifier that counts its calls and returns a deterministic report.
#[derive(Debug, Default)]
pub struct CountingVerifier {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A verifier whose every call fails with [`CacheError::Verifier`].
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Number of times `verify` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Verifier for CountingVerifier {
    async fn verify(&self, request: &VerificationRequest) -> CacheResult<VerificationReport> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(CacheError::Verifier {
                reason: format!("verifier call {} failed", call),
            });
        }
        Ok(fixtures::report_for(
            &request.tier,
            &compute_content_hash(&request.impl_content),
        ))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating tiercache types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a Timestamp (DateTime<Utc>).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        // Generate timestamps within a reasonable range (2020-2030)
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// Generate spec or implementation text.
    pub fn arb_content() -> impl Strategy<Value = String> {
        "[ -~\n]{0,256}"
    }

    /// Generate a ContentHash from arbitrary text.
    pub fn arb_content_hash() -> impl Strategy<Value = ContentHash> {
        arb_content().prop_map(|content| compute_content_hash(&content))
    }

    /// Generate a VerificationTier, including custom tiers.
    pub fn arb_tier() -> impl Strategy<Value = VerificationTier> {
        prop_oneof![
            Just(VerificationTier::Structure),
            Just(VerificationTier::Behavior),
            Just(VerificationTier::AiReview),
            prop::sample::select(vec!["perf", "security", "lint", "mutation"])
                .prop_filter_map("valid custom tier", VerificationTier::custom),
        ]
    }

    /// Generate a model version string.
    pub fn arb_model_version() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9.-]{0,23}"
    }

    /// Generate a CacheKey built from hashes of arbitrary content.
    pub fn arb_cache_key() -> impl Strategy<Value = CacheKey> {
        (
            arb_content_hash(),
            arb_content_hash(),
            arb_tier(),
            prop::option::of(arb_model_version()),
        )
            .prop_map(|(spec, implementation, tier, model)| {
                CacheKey::new(spec, implementation, tier, model)
            })
    }

    /// Generate a file path of the kind used as a dependency.
    pub fn arb_file_path() -> impl Strategy<Value = String> {
        "src/[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.(ts|rs|md)"
    }

    /// Generate StoreOptions.
    pub fn arb_store_options() -> impl Strategy<Value = StoreOptions> {
        (
            prop::collection::vec(arb_file_path(), 0..4),
            prop::option::of(arb_file_path()),
            prop::option::of(arb_file_path()),
        )
            .prop_map(|(dependencies, spec_name, impl_path)| StoreOptions {
                dependencies,
                spec_name,
                impl_path,
            })
    }

    /// Generate a valid CacheConfig.
    pub fn arb_valid_config() -> impl Strategy<Value = CacheConfig> {
        (
            1i64..604_800_000,
            1i64..604_800_000,
            1i64..604_800_000,
            1i64..604_800_000,
            1usize..2000,
            any::<bool>(),
        )
            .prop_map(
                |(structure, behavior, ai, default, max_entries, transitive)| {
                    CacheConfig::new()
                        .with_structure_ttl_ms(structure)
                        .with_behavior_ttl_ms(behavior)
                        .with_ai_ttl_ms(ai)
                        .with_default_ttl_ms(default)
                        .with_max_entries(max_entries)
                        .with_transitive_invalidation(transitive)
                },
            )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    pub const SPEC_TEXT: &str = "# Greeter\n\n`greet(name)` returns `Hello, <name>!`.\n";
    pub const IMPL_TEXT: &str =
        "export function greet(name: string) {\n  return `Hello, ${name}!`;\n}\n";
    pub const IMPL_TEXT_EDITED: &str =
        "export function greet(name: string) {\n  return `Hi, ${name}!`;\n}\n";

    /// Fixed instant all clock-driven tests start from.
    pub fn start_time() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A manual clock positioned at [`start_time`].
    pub fn manual_clock() -> ManualClock {
        ManualClock::new(start_time())
    }

    /// An in-memory cache driven by the returned clock.
    pub fn in_memory_cache(config: CacheConfig) -> (VerificationCache<InMemoryStorage>, ManualClock) {
        cache_over(Arc::new(InMemoryStorage::new()), config)
    }

    /// A cache over `storage` driven by the returned clock.
    pub fn cache_over<S: StorageAdapter>(
        storage: Arc<S>,
        config: CacheConfig,
    ) -> (VerificationCache<S>, ManualClock) {
        let clock = manual_clock();
        let cache = VerificationCache::new(storage, config).with_clock(Arc::new(clock.clone()));
        (cache, clock)
    }

    /// Deterministic report for a tier and implementation hash.
    pub fn report_for(tier: &VerificationTier, impl_hash: &ContentHash) -> VerificationReport {
        json!({
            "tier": tier.as_str(),
            "impl": impl_hash.prefix(8),
            "passed": true,
            "findings": [],
        })
    }

    /// A failing AI review report.
    pub fn failing_ai_report() -> VerificationReport {
        json!({
            "tier": "ai_review",
            "passed": false,
            "findings": [{"severity": "high", "message": "greeting text differs"}],
        })
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for lookup outcomes.

    use super::*;

    /// Assert that a lookup hit.
    #[track_caller]
    pub fn assert_hit(outcome: &LookupOutcome) {
        assert!(outcome.is_hit(), "Expected hit, got: {:?}", outcome);
    }

    /// Assert that a lookup missed for the given reason.
    #[track_caller]
    pub fn assert_miss(outcome: &LookupOutcome, expected: MissReason) {
        match outcome {
            LookupOutcome::Miss(reason) => assert_eq!(*reason, expected, "Wrong miss reason"),
            LookupOutcome::Hit(entry) => {
                panic!("Expected {} miss, got hit on {}", expected, entry.key)
            }
        }
    }

    /// Assert that a result is a storage error.
    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &CacheResult<T>) {
        match result {
            Err(CacheError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
