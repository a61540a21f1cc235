//! LMDB-backed storage adapter.
//!
//! Uses the heed crate (Rust bindings for LMDB) to provide a persistent,
//! memory-mapped key-value store for cache entries.
//!
//! # Layout
//!
//! A single unnamed database maps key string bytes to the JSON encoding of
//! the [`CacheEntry`]. JSON keeps the opaque report payload intact and
//! makes the file inspectable with standard LMDB tools.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The adapter uses:
//! - Read transactions for `get`, `keys` and `stats`
//! - Write transactions for `set`, `delete` and `clear`

use std::path::Path;

use async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tiercache_core::{CacheEntry, CacheError, CacheResult, StorageError};

use super::traits::{StorageAdapter, StorageStats, StorageStatsProvider};

/// Error type for LMDB storage operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStorageError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert LmdbStorageError to CacheError.
impl From<LmdbStorageError> for CacheError {
    fn from(e: LmdbStorageError) -> Self {
        let storage = match e {
            LmdbStorageError::Io(io) => StorageError::from(io),
            LmdbStorageError::Deserialization(reason) => StorageError::Deserialization {
                key: String::new(),
                reason,
            },
            other => StorageError::TransactionFailed {
                reason: other.to_string(),
            },
        };
        CacheError::Storage(storage)
    }
}

/// LMDB-backed persistent storage.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tiercache_storage::{LmdbStorage, VerificationCache};
///
/// let storage = Arc::new(LmdbStorage::new("/var/cache/tiercache", 256)?);
/// let cache = VerificationCache::with_defaults(storage);
/// ```
pub struct LmdbStorage {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
}

impl LmdbStorage {
    /// Open (or create) an LMDB storage directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStorageError> {
        // Ensure directory exists
        std::fs::create_dir_all(&path)?;

        // Safety: the environment is opened once per directory by this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStorageError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStorageError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }
}

#[async_trait]
impl StorageAdapter for LmdbStorage {
    async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        let bytes = self
            .db
            .get(&rtxn, key.as_bytes())
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        match bytes {
            Some(bytes) => {
                let entry: CacheEntry = serde_json::from_slice(bytes).map_err(|e| {
                    StorageError::Deserialization {
                        key: key.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> CacheResult<()> {
        let value = serde_json::to_vec(&entry).map_err(|e| StorageError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        self.db
            .put(&mut wtxn, key.as_bytes(), &value)
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        self.db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        Ok(())
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        let iter = self
            .db
            .iter(&rtxn)
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        let mut keys = Vec::new();
        for result in iter {
            let (key, _) = result.map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;
            let key = std::str::from_utf8(key)
                .map_err(|e| LmdbStorageError::Deserialization(e.to_string()))?;
            keys.push(key.to_string());
        }

        Ok(keys)
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        self.db
            .clear(&mut wtxn)
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        Ok(())
    }

    fn stats_provider(&self) -> Option<&dyn StorageStatsProvider> {
        Some(self)
    }
}

#[async_trait]
impl StorageStatsProvider for LmdbStorage {
    async fn stats(&self) -> CacheResult<StorageStats> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        let entry_count = self
            .db
            .len(&rtxn)
            .map_err(|e| LmdbStorageError::Transaction(e.to_string()))?;

        // Disk size is advisory; a failure here only drops the figure.
        let memory_usage = self.env.real_disk_size().ok();

        Ok(StorageStats {
            entry_count,
            memory_usage,
        })
    }
}
