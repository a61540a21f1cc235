//! tiercache Storage - Storage Adapters and Verification Cache
//!
//! Defines the storage adapter contract, the in-memory and LMDB adapters,
//! and the [`VerificationCache`] service that decides whether a cached
//! verification result can be reused.

pub mod cache;

pub use cache::{
    hit_rate_percent, CacheStats, CachedVerification, InMemoryStorage, LmdbStorage,
    LmdbStorageError, LookupOutcome, StorageAdapter, StorageStats, StorageStatsProvider,
    StoreOptions, VerificationCache, VerificationRequest, Verifier,
};
