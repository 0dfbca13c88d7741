//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes for the selected environment
//! - Look up the route for a request path
//! - Compute the upstream URI for a matched request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (tables are single digits)
//! - Explicit `None` rather than silent default

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Uri};
use serde::Serialize;
use url::Url;

use crate::config::loader::ConfigurationError;
use crate::config::schema::{RewriteRule, RouteEntry};
use crate::config::validation::validate_routes;
use crate::config::Environment;
use crate::routing::matcher::PathPrefixMatcher;

/// Resolved upstream target.
#[derive(Debug, Clone)]
pub struct Upstream {
    authority: Authority,
    host_header: HeaderValue,
    base_path: String,
}

impl Upstream {
    /// Parse an absolute `http://host[:port][/base]` target.
    pub fn parse(target: &str) -> Option<Self> {
        let url = Url::parse(target).ok()?;
        if url.scheme() != "http" {
            return None;
        }
        let host = url.host_str()?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Some(Self {
            authority: authority.parse().ok()?,
            host_header: HeaderValue::from_str(&authority).ok()?,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Value for the `Host` header when the route changes origin.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    matcher: PathPrefixMatcher,
    upstream: Upstream,
    rewrite: Option<RewriteRule>,
    change_origin: bool,
    allow_websocket: bool,
}

impl Route {
    fn compile(entry: &RouteEntry) -> Result<Self, ConfigurationError> {
        let upstream = Upstream::parse(&entry.target).ok_or_else(|| ConfigurationError::InvalidUpstream {
            prefix: entry.path_prefix.clone(),
            target: entry.target.clone(),
        })?;

        Ok(Self {
            matcher: PathPrefixMatcher::new(entry.path_prefix.as_str()),
            upstream,
            rewrite: entry.rewrite.clone(),
            change_origin: entry.change_origin,
            allow_websocket: entry.websocket,
        })
    }

    /// Route identifier for logs and metrics.
    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    pub fn allow_websocket(&self) -> bool {
        self.allow_websocket
    }

    /// Apply the rewrite rule (if any) to the matched path.
    pub fn rewrite_path(&self, path: &str) -> String {
        match &self.rewrite {
            Some(rule) => rule.apply(path),
            None => path.to_string(),
        }
    }

    /// Absolute upstream URI for `original`: rewritten path under the
    /// target's base path, query string preserved.
    pub fn upstream_uri(&self, original: &Uri) -> Result<Uri, axum::http::Error> {
        let mut target = format!("{}{}", self.upstream.base_path, self.rewrite_path(original.path()));
        if let Some(query) = original.query() {
            target.push('?');
            target.push_str(query);
        }
        let path_and_query = PathAndQuery::try_from(target)?;

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.upstream.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

/// The route table for one environment.
#[derive(Debug)]
pub struct RouteTable {
    environment: Environment,
    entries: Vec<RouteEntry>,
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile `entries` in order. Overlapping prefixes and bad targets are
    /// rejected here so lookup can stop at the first hit.
    pub fn new(environment: Environment, entries: &[RouteEntry]) -> Result<Self, ConfigurationError> {
        let mut errors = Vec::new();
        validate_routes(environment.as_str(), entries, &mut errors);
        if !errors.is_empty() {
            return Err(ConfigurationError::Validation(errors));
        }

        let routes = entries.iter().map(Route::compile).collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            environment,
            entries: entries.to_vec(),
            routes,
        })
    }

    /// First route whose prefix matches `path`, if any.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(path))
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Source entries, in table order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Serializable snapshot of the table.
    pub fn describe(&self) -> RouteTableSummary<'_> {
        RouteTableSummary {
            environment: self.environment.as_str(),
            routes: &self.entries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RouteTableSummary<'a> {
    pub environment: &'a str,
    pub routes: &'a [RouteEntry],
}
