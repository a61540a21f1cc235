//! Lookup outcomes and store options.
//!
//! A miss is a value, not an error: callers branch on [`LookupOutcome`] and
//! can report why a cached result was not reusable.

use tiercache_core::{CacheEntry, MissReason, VerificationReport};

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// A fresh entry whose hashes (and model version, for AI review) match.
    Hit(CacheEntry),
    /// No reusable entry.
    Miss(MissReason),
}

impl LookupOutcome {
    /// Check if this was a cache hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Check if this was a cache miss.
    pub fn is_miss(&self) -> bool {
        !self.is_hit()
    }

    /// Get a reference to the cached entry on a hit.
    pub fn entry(&self) -> Option<&CacheEntry> {
        match self {
            Self::Hit(entry) => Some(entry),
            Self::Miss(_) => None,
        }
    }

    /// Consume the outcome and return the entry on a hit.
    pub fn into_entry(self) -> Option<CacheEntry> {
        match self {
            Self::Hit(entry) => Some(entry),
            Self::Miss(_) => None,
        }
    }

    /// The cached report on a hit.
    pub fn report(&self) -> Option<&VerificationReport> {
        self.entry().map(|entry| &entry.result)
    }

    /// Why the lookup missed, or `None` on a hit.
    pub fn miss_reason(&self) -> Option<MissReason> {
        match self {
            Self::Hit(_) => None,
            Self::Miss(reason) => Some(*reason),
        }
    }
}

/// Metadata recorded alongside a stored report.
///
/// The dependency list and paths drive `invalidate_for_file`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub dependencies: Vec<String>,
    pub spec_name: Option<String>,
    pub impl_path: Option<String>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the files whose change should invalidate the entry.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Add a single dependency.
    pub fn with_dependency(mut self, path: impl Into<String>) -> Self {
        self.dependencies.push(path.into());
        self
    }

    pub fn with_spec_name(mut self, spec_name: impl Into<String>) -> Self {
        self.spec_name = Some(spec_name.into());
        self
    }

    pub fn with_impl_path(mut self, impl_path: impl Into<String>) -> Self {
        self.impl_path = Some(impl_path.into());
        self
    }
}
