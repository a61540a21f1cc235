//! tiercache Core - Data Types
//!
//! Pure data structures and leaf logic shared by every other crate: content
//! hashing, verification tiers, cache keys and their string codec, cache
//! entries, configuration, and the error taxonomy.
//! This crate performs no I/O.

use chrono::{DateTime, Utc};

pub mod clock;
pub mod config;
pub mod entry;
pub mod enums;
pub mod error;
pub mod identity;
pub mod key;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    CacheConfig, DEFAULT_AI_TTL_MS, DEFAULT_BEHAVIOR_TTL_MS, DEFAULT_MAX_ENTRIES,
    DEFAULT_STRUCTURE_TTL_MS, DEFAULT_TTL_MS,
};
pub use entry::{CacheEntry, EntryMeta, VerificationReport};
pub use enums::{CustomTier, MissReason, VerificationTier};
pub use error::{CacheError, CacheResult, ConfigError, StorageError};
pub use identity::{compute_content_hash, ContentHash};
pub use key::{CacheKey, HASH_PREFIX_LEN, KEY_SCHEMA_VERSION};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Duration in milliseconds for TTL values.
pub type DurationMs = i64;

// ============================================================================
// TESTS
// ============================================================================
