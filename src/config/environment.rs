//! Deployment environment key.
//!
//! The environment is chosen once at process start (`DEPLOY_ENV`) and selects
//! which route table slice the edge server proxies with. Names are compared
//! case-insensitively and the common long spellings fold onto the short keys
//! used by the built-in tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A symbolic deployment environment name, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Environment(String);

impl Environment {
    /// Environment used when no selector is provided.
    pub const DEFAULT: &'static str = "dev";

    /// Create an environment key, folding known aliases.
    pub fn new(name: impl AsRef<str>) -> Self {
        let normalized = name.as_ref().trim().to_ascii_lowercase();
        let canonical = match normalized.as_str() {
            "development" | "develop" => "dev",
            "staging" | "preproduction" | "pre-production" => "pre",
            "production" => "prod",
            other => other,
        };
        Self(canonical.to_string())
    }

    /// Resolve the selector value, falling back to [`Environment::DEFAULT`]
    /// when it is absent or blank.
    pub fn from_selector(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self::new(v),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.0
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
