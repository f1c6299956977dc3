//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method (exact)
//! - Match request path (exact, case-sensitive)
//! - Classify paths as API or static by prefix
//!
//! # Design Decisions
//! - No trailing-slash normalization, no parameters, no wildcards
//! - No regex to guarantee O(n) matching

use axum::http::Method;

/// Exact (method, path) condition for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactMatcher {
    method: Method,
    path: String,
}

impl ExactMatcher {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// True only for an identical method and an identical path string.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.path == path
    }
}

/// Matches the request path prefix reserved for API routes.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}
