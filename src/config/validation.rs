//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject overlapping path prefixes within an environment
//! - Reject environment names that fold onto the same key
//! - Check rewrite rules stay inside their route's prefix
//! - Check upstream targets are absolute `http://` URLs
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::BTreeMap;
use url::Url;

use crate::config::environment::Environment;
use crate::config::schema::{EdgeConfig, RouteEntry};
use crate::routing::matcher::PathPrefixMatcher;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no environments are configured")]
    NoEnvironments,

    #[error("environments `{first}` and `{second}` both select `{environment}`")]
    DuplicateEnvironment {
        environment: String,
        first: String,
        second: String,
    },

    #[error("[{environment}] route has an empty path prefix")]
    EmptyPrefix { environment: String },

    #[error("[{environment}] path prefix `{prefix}` must start with `/`")]
    RelativePrefix { environment: String, prefix: String },

    #[error("[{environment}] path prefixes `{first}` and `{second}` overlap")]
    OverlappingPrefixes {
        environment: String,
        first: String,
        second: String,
    },

    #[error("[{environment}] rewrite pattern `{pattern}` on `{prefix}` must be `^` followed by a prefix of the route")]
    RewriteOutsidePrefix {
        environment: String,
        prefix: String,
        pattern: String,
    },

    #[error("[{environment}] rewrite replacement `{replacement}` on `{prefix}` must be empty or an absolute path")]
    InvalidReplacement {
        environment: String,
        prefix: String,
        replacement: String,
    },

    #[error("[{environment}] target `{target}` on `{prefix}` is invalid: {reason}")]
    InvalidTarget {
        environment: String,
        prefix: String,
        target: String,
        reason: String,
    },

    #[error("`{field}` must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("static entry document name is empty")]
    EmptyEntryDocument,
}

/// Validate the whole configuration, collecting every error.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.environments.is_empty() {
        errors.push(ValidationError::NoEnvironments);
    }

    let mut canonical: BTreeMap<Environment, &str> = BTreeMap::new();
    for name in config.environments.keys() {
        let key = Environment::new(name);
        match canonical.get(&key) {
            Some(first) => errors.push(ValidationError::DuplicateEnvironment {
                environment: key.to_string(),
                first: first.to_string(),
                second: name.clone(),
            }),
            None => {
                canonical.insert(key, name.as_str());
            }
        }
    }

    for (environment, env_config) in &config.environments {
        validate_routes(environment, &env_config.routes, &mut errors);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "timeouts.connect_secs" });
    }
    if config.listener.max_in_flight == 0 {
        errors.push(ValidationError::ZeroValue { field: "listener.max_in_flight" });
    }
    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue { field: "security.max_body_bytes" });
    }
    if config.static_files.entry_document.trim().is_empty() {
        errors.push(ValidationError::EmptyEntryDocument);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub(crate) fn validate_routes(environment: &str, routes: &[RouteEntry], errors: &mut Vec<ValidationError>) {
    for (i, route) in routes.iter().enumerate() {
        let prefix = &route.path_prefix;

        if prefix.is_empty() {
            errors.push(ValidationError::EmptyPrefix {
                environment: environment.to_string(),
            });
            continue;
        }
        if !prefix.starts_with('/') {
            errors.push(ValidationError::RelativePrefix {
                environment: environment.to_string(),
                prefix: prefix.clone(),
            });
        }

        let matcher = PathPrefixMatcher::new(prefix.as_str());
        for other in &routes[i + 1..] {
            if !other.path_prefix.is_empty() && matcher.overlaps(&PathPrefixMatcher::new(other.path_prefix.as_str())) {
                errors.push(ValidationError::OverlappingPrefixes {
                    environment: environment.to_string(),
                    first: prefix.clone(),
                    second: other.path_prefix.clone(),
                });
            }
        }

        if let Some(rule) = &route.rewrite {
            let inside = rule
                .anchored_prefix()
                .map(|p| prefix.starts_with(p))
                .unwrap_or(false);
            if !inside {
                errors.push(ValidationError::RewriteOutsidePrefix {
                    environment: environment.to_string(),
                    prefix: prefix.clone(),
                    pattern: rule.pattern.clone(),
                });
            }

            let replacement = &rule.replacement;
            let well_formed = replacement.is_empty()
                || (replacement.starts_with('/')
                    && !replacement.contains(|c: char| c.is_whitespace() || c == '?' || c == '#'));
            if !well_formed {
                errors.push(ValidationError::InvalidReplacement {
                    environment: environment.to_string(),
                    prefix: prefix.clone(),
                    replacement: replacement.clone(),
                });
            }
        }

        if let Err(reason) = check_target(&route.target) {
            errors.push(ValidationError::InvalidTarget {
                environment: environment.to_string(),
                prefix: prefix.clone(),
                target: route.target.clone(),
                reason,
            });
        }
    }
}

fn check_target(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}
