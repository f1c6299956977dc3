//! Error taxonomy for the edge layer.
//!
//! # Design Decisions
//! - One enum for every failure the request pipeline can observe
//! - Each variant maps to exactly one status code (`EdgeError::status`)
//! - Client-facing bodies are always `{"error": "<message>"}`; internal
//!   detail stays in the server log

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::routing::reply::error_json;

/// Errors produced while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// Request body was not valid JSON.
    #[error("malformed JSON body: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request body could not be read (or exceeded the configured limit).
    #[error("failed to read request body: {0}")]
    Body(String),

    /// Request target could not be turned into a URL.
    #[error("invalid request target: {0}")]
    BadRequest(String),

    /// Missing or malformed credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Path resolves outside the public root.
    #[error("path escapes public root: {0}")]
    Forbidden(String),

    /// No route, or no readable file.
    #[error("not found")]
    NotFound,

    /// A response was already written for this exchange.
    #[error("response already written")]
    AlreadyResponded,

    /// The event stream peer went away or the session was closed.
    #[error("event stream closed")]
    StreamClosed,

    /// A compression codec failed.
    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),

    /// Route registration rejected.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EdgeError {
    /// Status code this error maps to when rendered for a client.
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::Parse(_) | EdgeError::Body(_) | EdgeError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            EdgeError::Unauthorized => StatusCode::UNAUTHORIZED,
            EdgeError::Forbidden(_) => StatusCode::FORBIDDEN,
            EdgeError::NotFound => StatusCode::NOT_FOUND,
            EdgeError::AlreadyResponded
            | EdgeError::StreamClosed
            | EdgeError::Compression(_)
            | EdgeError::InvalidRoute(_)
            | EdgeError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to a client.
    fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "Bad request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not found",
            _ => "INTERNAL SERVER ERROR",
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        error_json(self.status(), self.public_message())
    }
}
