//! Storage adapter traits and statistics types.
//!
//! This module defines the contract every storage backend implements, plus
//! the optional statistics capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tiercache_core::{CacheEntry, CacheResult};

/// Storage adapter trait for pluggable cache backends.
///
/// This trait abstracts over different backends (in-memory, LMDB, a remote
/// store). Implementations must be thread-safe; the verification cache issues
/// no multi-step transactions, so each method only needs to be atomic on its
/// own.
///
/// # Key Format
///
/// Keys are canonical key strings produced by
/// [`CacheKey::encode`](tiercache_core::CacheKey::encode). Adapters treat
/// them as opaque.
///
/// # Errors
///
/// Backend failures are returned as [`CacheError::Storage`](tiercache_core::CacheError).
/// An absent key is NOT an error: `get` returns `Ok(None)`.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Get the entry stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>>;

    /// Store `entry` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, entry: CacheEntry) -> CacheResult<()>;

    /// Delete the entry under `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Snapshot of every stored key.
    ///
    /// Must be complete: invalidation and pruning scan this list.
    async fn keys(&self) -> CacheResult<Vec<String>>;

    /// Remove every entry.
    async fn clear(&self) -> CacheResult<()>;

    /// Optional capability for backend-reported statistics.
    ///
    /// Backends that can count their entries cheaply return `Some(self)`.
    fn stats_provider(&self) -> Option<&dyn StorageStatsProvider> {
        None
    }
}

/// Optional capability: backend-reported statistics.
#[async_trait]
pub trait StorageStatsProvider: Send + Sync {
    /// Best-effort statistics about the backend's contents.
    async fn stats(&self) -> CacheResult<StorageStats>;
}

/// Statistics reported by a storage backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Number of entries currently stored.
    pub entry_count: u64,
    /// Approximate memory (or disk) usage in bytes.
    pub memory_usage: Option<u64>,
}

/// Statistics about cache usage.
///
/// `hits` and `misses` belong to one [`VerificationCache`](super::VerificationCache)
/// instance. Two instances over the same backend each count their own
/// lookups; the counters are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entries currently in the backend.
    pub total_entries: u64,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as an integer percentage (0 to 100).
    pub hit_rate: u8,
    /// Approximate memory usage in bytes, when the backend reports it.
    pub memory_usage: Option<u64>,
}

/// Calculate the hit rate as a rounded integer percentage.
///
/// Defined as 0 when there have been no lookups.
pub fn hit_rate_percent(hits: u64, misses: u64) -> u8 {
    let total = hits + misses;
    if total == 0 {
        0
    } else {
        ((hits as f64 / total as f64) * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_percent() {
        assert_eq!(hit_rate_percent(3, 1), 75);
        assert_eq!(hit_rate_percent(80, 20), 80);
        assert_eq!(hit_rate_percent(1, 2), 33);
        assert_eq!(hit_rate_percent(2, 1), 67);
        assert_eq!(hit_rate_percent(5, 0), 100);
        assert_eq!(hit_rate_percent(0, 5), 0);
    }

    #[test]
    fn test_hit_rate_percent_without_lookups_is_zero() {
        assert_eq!(hit_rate_percent(0, 0), 0);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            total_entries: 3,
            hits: 3,
            misses: 1,
            hit_rate: 75,
            memory_usage: None,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hit_rate"], 75);
        assert_eq!(json["total_entries"], 3);
    }
}
