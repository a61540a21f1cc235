//! Enum types for tiercache

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// VERIFICATION TIER
// ============================================================================

/// Cost/strictness level of a verification check.
///
/// Each tier has its own expiration policy. The cache does not order tiers or
/// make one depend on another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VerificationTier {
    /// Cheap structural check.
    Structure,
    /// Behavioral check.
    Behavior,
    /// AI-assisted review. Results are only valid for the model that produced them.
    AiReview,
    /// Any other tier name. Uses the default TTL.
    Custom(CustomTier),
}

impl VerificationTier {
    /// Build a tier outside the built-in set.
    ///
    /// Returns `None` for names [`CustomTier::new`] rejects, including
    /// aliases of the built-in tiers.
    pub fn custom(name: &str) -> Option<Self> {
        CustomTier::new(name).map(VerificationTier::Custom)
    }

    /// Canonical name used in key strings and serialized entries.
    pub fn as_str(&self) -> &str {
        match self {
            VerificationTier::Structure => "structure",
            VerificationTier::Behavior => "behavior",
            VerificationTier::AiReview => "ai_review",
            VerificationTier::Custom(custom) => custom.as_str(),
        }
    }

    /// Returns true for the AI review tier.
    pub fn is_ai_review(&self) -> bool {
        matches!(self, VerificationTier::AiReview)
    }
}

impl fmt::Display for VerificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Invalid VerificationTier: empty".to_string());
        }
        if trimmed.contains('|') {
            return Err(format!("Invalid VerificationTier: {}", s));
        }
        Ok(match normalize_token(trimmed).as_str() {
            "structure" | "structural" => VerificationTier::Structure,
            "behavior" | "behaviour" | "behavioral" => VerificationTier::Behavior,
            "aireview" | "ai" => VerificationTier::AiReview,
            _ => VerificationTier::Custom(CustomTier(trimmed.to_string())),
        })
    }
}

impl TryFrom<String> for VerificationTier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VerificationTier> for String {
    fn from(value: VerificationTier) -> Self {
        value.as_str().to_string()
    }
}

/// Name of a tier outside the built-in set.
///
/// The field is private: a name always survives the key string unchanged.
/// It is trimmed and non-empty, has no `|`, and is not an alias of
/// `structure`, `behavior` or `ai_review`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomTier(String);

impl CustomTier {
    /// Validate a custom tier name. Surrounding whitespace is trimmed.
    pub fn new(name: &str) -> Option<Self> {
        match name.parse::<VerificationTier>() {
            Ok(VerificationTier::Custom(custom)) => Some(custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// MISS REASON
// ============================================================================

/// Why a lookup did not produce a usable entry.
///
/// A miss is an ordinary outcome, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// No entry stored under the key string.
    NotFound,
    /// The entry outlived its tier TTL and was deleted.
    Expired,
    /// The stored spec hash disagrees with the requested one.
    SpecChanged,
    /// The stored implementation hash disagrees with the requested one.
    ImplChanged,
    /// The AI review entry was produced by a different model version.
    ModelChanged,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::NotFound => "not_found",
            MissReason::Expired => "expired",
            MissReason::SpecChanged => "spec_changed",
            MissReason::ImplChanged => "impl_changed",
            MissReason::ModelChanged => "model_changed",
        }
    }
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "notfound" => Ok(MissReason::NotFound),
            "expired" => Ok(MissReason::Expired),
            "specchanged" => Ok(MissReason::SpecChanged),
            "implchanged" => Ok(MissReason::ImplChanged),
            "modelchanged" => Ok(MissReason::ModelChanged),
            _ => Err(format!("Invalid MissReason: {}", s)),
        }
    }
}

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_canonical_names() {
        assert_eq!(VerificationTier::Structure.to_string(), "structure");
        assert_eq!(VerificationTier::Behavior.to_string(), "behavior");
        assert_eq!(VerificationTier::AiReview.to_string(), "ai_review");
        assert_eq!(
            VerificationTier::custom("security").unwrap().to_string(),
            "security"
        );
    }

    #[test]
    fn test_tier_parse_aliases() {
        assert_eq!("structure".parse(), Ok(VerificationTier::Structure));
        assert_eq!("Behaviour".parse(), Ok(VerificationTier::Behavior));
        assert_eq!("ai-review".parse(), Ok(VerificationTier::AiReview));
        assert_eq!("AI_REVIEW".parse(), Ok(VerificationTier::AiReview));
        assert_eq!("perf".parse(), Ok(VerificationTier::custom("perf").unwrap()));
    }

    #[test]
    fn test_tier_parse_rejects_empty_and_pipes() {
        assert!("".parse::<VerificationTier>().is_err());
        assert!("   ".parse::<VerificationTier>().is_err());
        assert!("a|b".parse::<VerificationTier>().is_err());
    }

    #[test]
    fn test_tier_serde_uses_canonical_string() {
        let json = serde_json::to_string(&VerificationTier::AiReview).unwrap();
        assert_eq!(json, "\"ai_review\"");
        let tier: VerificationTier = serde_json::from_str("\"behavior\"").unwrap();
        assert_eq!(tier, VerificationTier::Behavior);
        let custom: VerificationTier = serde_json::from_str("\"fuzzing\"").unwrap();
        assert_eq!(custom, VerificationTier::custom("fuzzing").unwrap());
        assert!(serde_json::from_str::<VerificationTier>("\"a|b\"").is_err());
        assert!(serde_json::from_str::<VerificationTier>("\"\"").is_err());
    }

    #[test]
    fn test_custom_tier_rejects_unencodable_names() {
        assert!(CustomTier::new("").is_none());
        assert!(CustomTier::new("  ").is_none());
        assert!(CustomTier::new("lint|strict").is_none());
        assert!(VerificationTier::custom("lint|strict").is_none());
    }

    #[test]
    fn test_custom_tier_rejects_builtin_aliases() {
        assert!(CustomTier::new("structure").is_none());
        assert!(CustomTier::new("Behaviour").is_none());
        assert!(CustomTier::new("ai-review").is_none());
    }

    #[test]
    fn test_custom_tier_is_trimmed() {
        let custom = CustomTier::new("  perf ").unwrap();
        assert_eq!(custom.as_str(), "perf");
        assert_eq!(
            custom.as_str().parse::<VerificationTier>(),
            Ok(VerificationTier::Custom(custom.clone()))
        );
    }

    #[test]
    fn test_is_ai_review() {
        assert!(VerificationTier::AiReview.is_ai_review());
        assert!(!VerificationTier::Structure.is_ai_review());
        assert!(!VerificationTier::custom("ai_review_v2").unwrap().is_ai_review());
    }

    #[test]
    fn test_miss_reason_roundtrip() {
        let reasons = [
            MissReason::NotFound,
            MissReason::Expired,
            MissReason::SpecChanged,
            MissReason::ImplChanged,
            MissReason::ModelChanged,
        ];
        for reason in reasons {
            assert_eq!(reason.as_str().parse::<MissReason>(), Ok(reason));
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }
}
