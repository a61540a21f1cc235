//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};

/// One minute in milliseconds.
const MINUTE_MS: DurationMs = 60 * 1000;
/// One hour in milliseconds.
const HOUR_MS: DurationMs = 60 * MINUTE_MS;
/// One day in milliseconds.
const DAY_MS: DurationMs = 24 * HOUR_MS;

/// Default TTL for structural checks (7 days).
pub const DEFAULT_STRUCTURE_TTL_MS: DurationMs = 7 * DAY_MS;
/// Default TTL for behavioral checks (24 hours).
pub const DEFAULT_BEHAVIOR_TTL_MS: DurationMs = DAY_MS;
/// Default TTL for AI review (6 hours).
pub const DEFAULT_AI_TTL_MS: DurationMs = 6 * HOUR_MS;
/// Default TTL for any other tier (24 hours).
pub const DEFAULT_TTL_MS: DurationMs = DAY_MS;
/// Default entry bound before FIFO pruning kicks in.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Configuration for the verification cache.
///
/// Every field is optional when deserializing; missing fields fall back to
/// the `DEFAULT_*` constants.
///
/// Cheaper, more deterministic tiers stay valid longer. AI review results
/// are the most perishable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub structure_ttl_ms: DurationMs,
    pub behavior_ttl_ms: DurationMs,
    pub ai_ttl_ms: DurationMs,
    /// TTL for any tier without its own setting.
    pub default_ttl_ms: DurationMs,
    /// Soft upper bound on stored entries.
    pub max_entries: usize,
    /// Enables `invalidate_for_file`. When off, file invalidation is a no-op.
    pub transitive_invalidation: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            structure_ttl_ms: DEFAULT_STRUCTURE_TTL_MS,
            behavior_ttl_ms: DEFAULT_BEHAVIOR_TTL_MS,
            ai_ttl_ms: DEFAULT_AI_TTL_MS,
            default_ttl_ms: DEFAULT_TTL_MS,
            max_entries: DEFAULT_MAX_ENTRIES,
            transitive_invalidation: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structure_ttl_ms(mut self, ttl_ms: DurationMs) -> Self {
        self.structure_ttl_ms = ttl_ms;
        self
    }

    pub fn with_behavior_ttl_ms(mut self, ttl_ms: DurationMs) -> Self {
        self.behavior_ttl_ms = ttl_ms;
        self
    }

    pub fn with_ai_ttl_ms(mut self, ttl_ms: DurationMs) -> Self {
        self.ai_ttl_ms = ttl_ms;
        self
    }

    pub fn with_default_ttl_ms(mut self, ttl_ms: DurationMs) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }

    /// Set the max entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Enable or disable file-based invalidation.
    pub fn with_transitive_invalidation(mut self, enabled: bool) -> Self {
        self.transitive_invalidation = enabled;
        self
    }

    /// TTL in milliseconds for entries of the given tier.
    pub fn ttl_for(&self, tier: &VerificationTier) -> DurationMs {
        match tier {
            VerificationTier::Structure => self.structure_ttl_ms,
            VerificationTier::Behavior => self.behavior_ttl_ms,
            VerificationTier::AiReview => self.ai_ttl_ms,
            VerificationTier::Custom(_) => self.default_ttl_ms,
        }
    }

    /// Validate the configuration.
    /// Returns Ok(()) if valid, Err(CacheError::Config) if invalid.
    ///
    /// Validates:
    /// - every TTL is positive
    /// - max_entries > 0
    pub fn validate(&self) -> CacheResult<()> {
        let ttls = [
            ("structure_ttl_ms", self.structure_ttl_ms),
            ("behavior_ttl_ms", self.behavior_ttl_ms),
            ("ai_ttl_ms", self.ai_ttl_ms),
            ("default_ttl_ms", self.default_ttl_ms),
        ];
        for (field, value) in ttls {
            if value <= 0 {
                return Err(CacheError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: format!("{} must be positive", field),
                }));
            }
        }

        if self.max_entries == 0 {
            return Err(CacheError::Config(ConfigError::InvalidValue {
                field: "max_entries".to_string(),
                value: self.max_entries.to_string(),
                reason: "max_entries must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_order_tiers_by_perishability() {
        let config = CacheConfig::default();
        assert!(config.structure_ttl_ms > config.behavior_ttl_ms);
        assert!(config.behavior_ttl_ms > config.ai_ttl_ms);
        assert_eq!(config.max_entries, DEFAULT_MAX_ENTRIES);
        assert!(config.transitive_invalidation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ttl_for_each_tier() {
        let config = CacheConfig::new()
            .with_structure_ttl_ms(1)
            .with_behavior_ttl_ms(2)
            .with_ai_ttl_ms(3)
            .with_default_ttl_ms(4);
        assert_eq!(config.ttl_for(&VerificationTier::Structure), 1);
        assert_eq!(config.ttl_for(&VerificationTier::Behavior), 2);
        assert_eq!(config.ttl_for(&VerificationTier::AiReview), 3);
        assert_eq!(
            config.ttl_for(&VerificationTier::custom("perf").unwrap()),
            4
        );
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new()
            .with_max_entries(3)
            .with_transitive_invalidation(false);
        assert_eq!(config.max_entries, 3);
        assert!(!config.transitive_invalidation);
    }

    #[test]
    fn test_validate_rejects_non_positive_ttl() {
        let err = CacheConfig::new().with_ai_ttl_ms(0).validate().unwrap_err();
        match err {
            CacheError::Config(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "ai_ttl_ms")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_max_entries() {
        assert!(CacheConfig::new().with_max_entries(0).validate().is_err());
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"max_entries": 50, "ai_ttl_ms": 60000}"#).unwrap();
        assert_eq!(config.max_entries, 50);
        assert_eq!(config.ai_ttl_ms, 60_000);
        assert_eq!(config.structure_ttl_ms, DEFAULT_STRUCTURE_TTL_MS);
        assert_eq!(config.default_ttl_ms, DEFAULT_TTL_MS);
        assert!(config.transitive_invalidation);
    }
}
