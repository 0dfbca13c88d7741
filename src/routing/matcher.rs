//! Path prefix matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive and literal
//! - No regex to guarantee O(n) matching
//! - Overlap detection runs at construction so lookup never has to pick
//!   between two candidates

/// Matches the request path against a literal prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns true if `path` starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Two prefixes overlap when some path would match both, i.e. one is a
    /// prefix of the other.
    pub fn overlaps(&self, other: &PathPrefixMatcher) -> bool {
        self.prefix.starts_with(&other.prefix) || other.prefix.starts_with(&self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
