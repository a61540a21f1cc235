//! In-memory storage adapter.
//!
//! A `HashMap` behind a `tokio::sync::RwLock`. The lock is the serialization
//! point for concurrent lookups and stores; nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tiercache_core::{CacheEntry, CacheResult};
use tokio::sync::RwLock;

use super::traits::{StorageAdapter, StorageStats, StorageStatsProvider};

/// In-memory storage for single-process caches and tests.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StorageAdapter for InMemoryStorage {
    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> CacheResult<()> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    fn stats_provider(&self) -> Option<&dyn StorageStatsProvider> {
        Some(self)
    }
}

#[async_trait]
impl StorageStatsProvider for InMemoryStorage {
    async fn stats(&self) -> CacheResult<StorageStats> {
        let entries = self.entries.read().await;
        // Approximation: key bytes plus the JSON size of each entry.
        let memory_usage = entries
            .iter()
            .map(|(key, entry)| {
                let entry_bytes = serde_json::to_vec(entry).map(|b| b.len()).unwrap_or(0);
                (key.len() + entry_bytes) as u64
            })
            .sum();
        Ok(StorageStats {
            entry_count: entries.len() as u64,
            memory_usage: Some(memory_usage),
        })
    }
}
