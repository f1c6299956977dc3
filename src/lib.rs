//! Embedded HTTP edge layer: static assets, exact-match JSON API routes,
//! compression, Server-Sent Events and per-identity rate limiting behind one
//! before/after hook pipeline.

// Core request path
pub mod http;
pub mod routing;
pub mod static_files;

// Response shaping
pub mod compression;
pub mod sse;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::EdgeConfig;
pub use error::EdgeError;
pub use http::{Dispatcher, EdgeServer, Exchange, HookPipeline};
pub use lifecycle::Shutdown;
pub use routing::{ApiRequest, ApiRouter, HandlerResult, JsonBody};
pub use sse::SseSession;
