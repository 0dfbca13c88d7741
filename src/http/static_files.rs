//! Static asset serving with SPA fallback.
//!
//! # Responsibilities
//! - Serve files from the build directory with a guessed content type
//! - Hand unknown paths to the entry document so the client router renders
//!   them
//! - Keep non-navigation methods from being masked by the entry document
//!
//! # Design Decisions
//! - `ServeDir` owns path decoding and traversal protection
//! - Missing and unreadable files are the same case: fall through
//! - HEAD is treated like GET (same headers, no body)
//! - Non-GET on an existing file is 405, on anything else 404

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::loader::ConfigurationError;
use crate::config::StaticFilesConfig;
use crate::observability::metrics::Outcome;

/// The pre-built application directory.
#[derive(Clone)]
pub struct StaticAssets {
    root: PathBuf,
    entry: PathBuf,
    serve_dir: ServeDir,
}

impl StaticAssets {
    /// Resolve the asset root and entry document; both must exist.
    pub fn new(config: &StaticFilesConfig) -> Result<Self, ConfigurationError> {
        let root = std::fs::canonicalize(&config.root)
            .map_err(|_| ConfigurationError::MissingAssetRoot(config.root.clone()))?;
        if !root.is_dir() {
            return Err(ConfigurationError::MissingAssetRoot(root));
        }

        let entry = root.join(&config.entry_document);
        if !entry.is_file() {
            return Err(ConfigurationError::MissingEntryDocument(entry));
        }

        Ok(Self {
            serve_dir: ServeDir::new(&root),
            root,
            entry,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve `request` from disk, falling back to the entry document.
    pub async fn serve(&self, request: Request<Body>) -> (Outcome, Response<Body>) {
        let method = request.method().clone();
        if method != Method::GET && method != Method::HEAD {
            return self.reject(request).await;
        }

        let headers = request.headers().clone();
        let response = infallible(self.serve_dir.clone().oneshot(request).await);
        if response.status() != StatusCode::NOT_FOUND {
            return (Outcome::Served, response.map(Body::new));
        }

        let mut fallback = Request::new(Body::empty());
        *fallback.method_mut() = method;
        *fallback.headers_mut() = headers;

        let mut response = infallible(ServeFile::new(&self.entry).oneshot(fallback).await).map(Body::new);
        if response.status() == StatusCode::NOT_FOUND {
            tracing::error!(entry = %self.entry.display(), "Entry document disappeared");
            return (Outcome::NotFound, response);
        }
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        (Outcome::FallbackServed, response)
    }

    async fn reject(&self, request: Request<Body>) -> (Outcome, Response<Body>) {
        let mut probe = Request::new(Body::empty());
        *probe.method_mut() = Method::HEAD;
        *probe.uri_mut() = request.uri().clone();

        let exists = infallible(self.serve_dir.clone().oneshot(probe).await)
            .status()
            .is_success();

        let mut response = Response::new(Body::empty());
        if exists {
            *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
        } else {
            *response.status_mut() = StatusCode::NOT_FOUND;
        }
        (Outcome::NotFound, response)
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
