//! URL path to file resolution and serving.
//!
//! # Responsibilities
//! - Map a request path to a file under the public root
//! - Reject anything that resolves outside the root (403) before touching it
//! - Read the file, pick its content type, compress text-like types
//!
//! # Design Decisions
//! - Two checks: a lexical one on the joined path, then a canonical one so a
//!   symlink inside the root cannot point outside it
//! - Every read failure is a plain 404; the cause is only logged

use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use percent_encoding::percent_decode_str;

use crate::compression::{negotiate, Compressor};
use crate::config::StaticConfig;
use crate::error::EdgeError;
use crate::static_files::mime::{content_type, is_compressible};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Serves files from a public root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
    compressor: Compressor,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>, compressor: Compressor) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self {
            root: normalize(&root),
            index_file: index_file.into(),
            compressor,
        }
    }

    pub fn from_config(config: &StaticConfig, compressor: Compressor) -> Self {
        Self::new(config.root.clone(), config.index_file.clone(), compressor)
    }

    /// Absolute, normalized public root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path to a file path under the root.
    ///
    /// The path is percent-decoded, a trailing `/` gets the index file, and
    /// the result is lexically normalized. Anything that lands outside the
    /// root is [`EdgeError::Forbidden`].
    pub fn resolve(&self, url_path: &str) -> Result<PathBuf, EdgeError> {
        let decoded = percent_decode_str(url_path)
            .decode_utf8()
            .map_err(|_| EdgeError::NotFound)?;
        if decoded.contains('\0') {
            return Err(EdgeError::Forbidden(url_path.to_string()));
        }

        let mut relative = decoded.trim_start_matches('/').to_string();
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str(&self.index_file);
        }

        let candidate = normalize(&self.root.join(&relative));
        if !candidate.starts_with(&self.root) {
            return Err(EdgeError::Forbidden(url_path.to_string()));
        }
        Ok(candidate)
    }

    /// Build the full response for a static request.
    pub async fn serve(&self, url_path: &str, request_headers: &HeaderMap) -> Response {
        let path = match self.resolve(url_path) {
            Ok(path) => path,
            Err(EdgeError::Forbidden(requested)) => {
                tracing::warn!(path = %requested, "Static path escapes public root");
                return forbidden();
            }
            Err(e) => {
                tracing::debug!(path = %url_path, error = %e, "Static path rejected");
                return not_found();
            }
        };

        match self.confined(&path).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(path = %path.display(), "Static file resolves outside public root");
                return forbidden();
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Static file unavailable");
                return not_found();
            }
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Static file unreadable");
                return not_found();
            }
        };

        self.respond(&path, bytes, request_headers).await
    }

    /// Whether the canonical form of `path` is still under the canonical root.
    async fn confined(&self, path: &Path) -> std::io::Result<bool> {
        let root = tokio::fs::canonicalize(&self.root).await?;
        let real = tokio::fs::canonicalize(path).await?;
        Ok(real.starts_with(root))
    }

    async fn respond(&self, path: &Path, raw: Bytes, request_headers: &HeaderMap) -> Response {
        let compressible = is_compressible(path);
        let mut body = raw;
        let mut applied = None;

        if compressible && self.compressor.enabled() {
            if let Some(encoding) = negotiate(request_headers.get(header::ACCEPT_ENCODING)) {
                match self.compressor.compress(body.clone(), encoding).await {
                    Ok(packed) => {
                        body = packed;
                        applied = Some(encoding);
                    }
                    Err(e) => {
                        tracing::warn!(encoding = %encoding, error = %e, "Compression failed; sending identity");
                    }
                }
            }
        }

        let length = body.len();
        let mut response = Response::new(Body::from(body));
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type(path)));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        if let Some(encoding) = applied {
            headers.insert(header::CONTENT_ENCODING, encoding.header_value());
        }
        if compressible {
            headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        }
        response
    }
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn plain(status: StatusCode, text: &'static str) -> Response {
    let mut response = Response::new(Body::from(text));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}

fn not_found() -> Response {
    plain(StatusCode::NOT_FOUND, "Not Found")
}

fn forbidden() -> Response {
    plain(StatusCode::FORBIDDEN, "Forbidden")
}
