//! Verification cache with pluggable storage.
//!
//! This module provides the tier-aware cache service, the storage adapter
//! contract it runs on, and two adapters: an in-memory map and LMDB.
//!
//! # Correctness Contract
//!
//! A lookup only hits when the stored entry was produced from byte-identical
//! spec and implementation text, at the same tier, and (for AI review) by the
//! same model version, and its tier TTL has not elapsed. Every other case is a
//! typed miss carrying a [`MissReason`](tiercache_core::MissReason).
//!
//! # Example
//!
//! ```ignore
//! let cache = VerificationCache::with_defaults(Arc::new(InMemoryStorage::new()));
//!
//! let request = VerificationRequest::new(spec_text, impl_text, VerificationTier::AiReview)
//!     .with_ai_model_version("model-2025-01")
//!     .with_options(StoreOptions::new().with_impl_path("src/foo.ts"));
//!
//! let verified = cache.verify(&request, &verifier).await?;
//! if !verified.was_cache_hit() {
//!     tracing::info!(reason = ?verified.miss_reason, "re-verified");
//! }
//! ```

pub mod lmdb_backend;
pub mod memory_backend;
pub mod outcome;
pub mod read_through;
pub mod service;
pub mod traits;

pub use lmdb_backend::{LmdbStorage, LmdbStorageError};
pub use memory_backend::InMemoryStorage;
pub use outcome::{LookupOutcome, StoreOptions};
pub use read_through::{CachedVerification, VerificationRequest, Verifier};
pub use service::VerificationCache;
pub use traits::{hit_rate_percent, CacheStats, StorageAdapter, StorageStats, StorageStatsProvider};
