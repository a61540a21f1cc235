//! Tier-aware verification cache service.
//!
//! Sits between an orchestrator and a [`StorageAdapter`]. Keys are content
//! addressed, entries expire per tier, and the key space is bounded by FIFO
//! pruning on every store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tiercache_core::{
    compute_content_hash, CacheConfig, CacheEntry, CacheKey, CacheResult, Clock, EntryMeta,
    MissReason, SystemClock, VerificationReport, VerificationTier, HASH_PREFIX_LEN,
};
use tracing::{debug, info, warn};

use super::outcome::{LookupOutcome, StoreOptions};
use super::traits::{hit_rate_percent, CacheStats, StorageAdapter};

/// Verification result cache over a pluggable storage adapter.
///
/// # Type Parameters
///
/// - `S`: The storage adapter holding entries
///
/// # Counters
///
/// Hit and miss counters belong to this instance. They are reset only by
/// [`clear`](Self::clear) and are never persisted.
///
/// # Example
///
/// ```ignore
/// let cache = VerificationCache::with_defaults(Arc::new(InMemoryStorage::new()));
///
/// let key = cache.create_key(&spec_text, &impl_text, VerificationTier::Structure, None);
/// match cache.lookup(&key).await? {
///     LookupOutcome::Hit(entry) => report(entry.result),
///     LookupOutcome::Miss(reason) => {
///         let result = run_checks(&spec_text, &impl_text).await?;
///         cache.store(&key, result, StoreOptions::new().with_impl_path("src/foo.ts")).await?;
///     }
/// }
/// ```
pub struct VerificationCache<S: StorageAdapter> {
    storage: Arc<S>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: StorageAdapter> VerificationCache<S> {
    /// Create a new verification cache.
    ///
    /// The configuration is used as given; see [`try_new`](Self::try_new)
    /// for a validating constructor.
    pub fn new(storage: Arc<S>, config: CacheConfig) -> Self {
        Self {
            storage,
            config,
            clock: Arc::new(SystemClock),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a new verification cache with default configuration.
    pub fn with_defaults(storage: Arc<S>) -> Self {
        Self::new(storage, CacheConfig::default())
    }

    /// Create a new verification cache, rejecting an invalid configuration.
    pub fn try_new(storage: Arc<S>, config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self::new(storage, config))
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a reference to the storage adapter.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Build a key from raw spec and implementation text.
    ///
    /// `ai_model_version` is dropped for every tier except
    /// [`VerificationTier::AiReview`].
    pub fn create_key(
        &self,
        spec_content: &str,
        impl_content: &str,
        tier: VerificationTier,
        ai_model_version: Option<&str>,
    ) -> CacheKey {
        CacheKey::new(
            compute_content_hash(spec_content),
            compute_content_hash(impl_content),
            tier,
            ai_model_version.map(str::to_string),
        )
    }

    /// Look up a cached result.
    ///
    /// Checks run in order and stop at the first miss:
    /// 1. nothing stored under the key string: `not_found` (or
    ///    `model_changed` when only another model's AI review is cached)
    /// 2. expired: the entry is deleted, `expired`
    /// 3. stored spec hash differs: `spec_changed`
    /// 4. stored implementation hash differs: `impl_changed`
    /// 5. AI review produced by another model version: `model_changed`
    ///
    /// A miss on an AI review key that carries a model version costs a full
    /// `keys()` scan, plus a `get` per sibling key, to tell `model_changed`
    /// from `not_found`. Every other lookup is a single `get`.
    ///
    /// Storage errors propagate unchanged.
    pub async fn lookup(&self, key: &CacheKey) -> CacheResult<LookupOutcome> {
        let key_string = key.encode();

        let outcome = match self.storage.get(&key_string).await? {
            None => LookupOutcome::Miss(self.reason_for_absent(key).await?),
            Some(entry) => self.check_entry(&key_string, key, entry).await?,
        };

        match &outcome {
            LookupOutcome::Hit(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key_string, "cache hit");
            }
            LookupOutcome::Miss(reason) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key_string, reason = %reason, "cache miss");
            }
        }

        Ok(outcome)
    }

    async fn check_entry(
        &self,
        key_string: &str,
        key: &CacheKey,
        entry: CacheEntry,
    ) -> CacheResult<LookupOutcome> {
        if entry.meta.is_expired_at(self.clock.now()) {
            self.storage.delete(key_string).await?;
            return Ok(LookupOutcome::Miss(MissReason::Expired));
        }

        // The key string only carries hash prefixes; compare full digests.
        if entry.key.spec_hash() != key.spec_hash() {
            return Ok(LookupOutcome::Miss(MissReason::SpecChanged));
        }
        if entry.key.impl_hash() != key.impl_hash() {
            return Ok(LookupOutcome::Miss(MissReason::ImplChanged));
        }

        if key.tier().is_ai_review() {
            if let Some(model) = key.ai_model_version() {
                if entry.key.ai_model_version() != Some(model) {
                    return Ok(LookupOutcome::Miss(MissReason::ModelChanged));
                }
            }
        }

        Ok(LookupOutcome::Hit(entry))
    }

    /// Classify a miss on an absent key string.
    ///
    /// The model version is part of the key string, so a stale AI review
    /// lives under a sibling key. A live sibling with the same hashes and a
    /// different model turns `not_found` into `model_changed`.
    async fn reason_for_absent(&self, key: &CacheKey) -> CacheResult<MissReason> {
        let Some(model) = key.ai_model_version() else {
            return Ok(MissReason::NotFound);
        };

        let unversioned = CacheKey::new(
            key.spec_hash().clone(),
            key.impl_hash().clone(),
            key.tier().clone(),
            None,
        );
        let sibling_prefix = format!("{}|model:", unversioned.encode());
        let now = self.clock.now();

        for candidate in self.storage.keys().await? {
            if !candidate.starts_with(&sibling_prefix) {
                continue;
            }
            if let Some(entry) = self.storage.get(&candidate).await? {
                if entry.key.spec_hash() == key.spec_hash()
                    && entry.key.impl_hash() == key.impl_hash()
                    && entry.key.ai_model_version() != Some(model)
                    && !entry.meta.is_expired_at(now)
                {
                    return Ok(MissReason::ModelChanged);
                }
            }
        }

        Ok(MissReason::NotFound)
    }

    /// Store a verification result under `key`.
    ///
    /// The entry expires after the tier's TTL. Pruning runs after every
    /// write, so the stored entry itself can be pruned when `max_entries`
    /// is smaller than the number of entries sharing its creation instant.
    pub async fn store(
        &self,
        key: &CacheKey,
        result: VerificationReport,
        options: StoreOptions,
    ) -> CacheResult<()> {
        let key_string = key.encode();
        let now = self.clock.now();
        let ttl_ms = self.config.ttl_for(key.tier());
        // A TTL too large to represent means the entry never expires.
        let expires_at =
            chrono::Duration::try_milliseconds(ttl_ms).and_then(|ttl| now.checked_add_signed(ttl));

        let entry = CacheEntry {
            key: key.clone(),
            result,
            meta: EntryMeta {
                created_at: now,
                expires_at,
                dependencies: options.dependencies,
                spec_name: options.spec_name,
                impl_path: options.impl_path,
            },
        };

        self.storage.set(&key_string, entry).await?;
        debug!(key = %key_string, tier = %key.tier(), ttl_ms, "stored verification result");

        self.prune_if_needed().await?;
        Ok(())
    }

    /// Delete every entry recorded against `file_path`.
    ///
    /// Matches the dependency list, the spec name and the implementation
    /// path. Returns 0 without touching storage when transitive invalidation
    /// is disabled.
    pub async fn invalidate_for_file(&self, file_path: &str) -> CacheResult<usize> {
        if !self.config.transitive_invalidation {
            return Ok(0);
        }

        let mut removed = 0;
        for key in self.storage.keys().await? {
            let Some(entry) = self.storage.get(&key).await? else {
                continue;
            };
            if entry.meta.references_file(file_path) {
                self.storage.delete(&key).await?;
                removed += 1;
            }
        }

        info!(file = file_path, removed, "invalidated entries for file");
        Ok(removed)
    }

    /// Delete every entry whose spec hash starts with `spec_hash_prefix`.
    ///
    /// The prefix is compared case-insensitively against the hash prefix in
    /// the key string, so anything beyond 16 hex characters is ignored. An
    /// empty prefix matches every decodable key. Keys that fail to decode
    /// are left alone.
    pub async fn invalidate_for_spec(&self, spec_hash_prefix: &str) -> CacheResult<usize> {
        let prefix: String = spec_hash_prefix
            .to_ascii_lowercase()
            .chars()
            .take(HASH_PREFIX_LEN)
            .collect();

        let mut removed = 0;
        for key in self.storage.keys().await? {
            match CacheKey::decode(&key) {
                Some(decoded) if decoded.spec_hash().starts_with(&prefix) => {
                    self.storage.delete(&key).await?;
                    removed += 1;
                }
                Some(_) => {}
                None => warn!(key = %key, "skipping undecodable cache key"),
            }
        }

        info!(prefix = %prefix, removed, "invalidated entries for spec");
        Ok(removed)
    }

    /// Remove every entry and reset the hit/miss counters.
    pub async fn clear(&self) -> CacheResult<()> {
        self.storage.clear().await?;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        info!("cleared verification cache");
        Ok(())
    }

    /// Snapshot of cache statistics.
    ///
    /// Entry count and memory usage come from the adapter when it reports
    /// stats; otherwise the keys are counted and memory usage is unknown.
    pub async fn stats(&self) -> CacheResult<CacheStats> {
        let (total_entries, memory_usage) = match self.storage.stats_provider() {
            Some(provider) => {
                let stats = provider.stats().await?;
                (stats.entry_count, stats.memory_usage)
            }
            None => (self.storage.keys().await?.len() as u64, None),
        };

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        Ok(CacheStats {
            total_entries,
            hits,
            misses,
            hit_rate: hit_rate_percent(hits, misses),
            memory_usage,
        })
    }

    /// Delete the oldest entries until at most `max_entries` remain.
    ///
    /// Oldest means earliest `created_at`; ties break on the key string.
    /// Not atomic with respect to concurrent stores.
    async fn prune_if_needed(&self) -> CacheResult<usize> {
        let max_entries = self.config.max_entries;
        let keys = self.storage.keys().await?;
        if keys.len() <= max_entries {
            return Ok(0);
        }

        let mut by_age = Vec::with_capacity(keys.len());
        for key in keys {
            match self.storage.get(&key).await? {
                Some(entry) => by_age.push((entry.meta.created_at, key)),
                None => warn!(key = %key, "entry vanished during prune scan"),
            }
        }
        if by_age.len() <= max_entries {
            return Ok(0);
        }

        by_age.sort();
        let excess = by_age.len() - max_entries;
        for (_, key) in by_age.iter().take(excess) {
            self.storage.delete(key).await?;
        }

        info!(removed = excess, max_entries, "pruned oldest cache entries");
        Ok(excess)
    }
}
