//! HTTP request handling.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, request ID, tracing span)
//!     → dispatcher.rs (one call per request)
//!         → exchange.rs (request head, URL, response slot)
//!         → hooks.rs (before-hooks; may respond early)
//!         → routing (API prefix) or static_files (everything else)
//!         → hooks.rs (after-hooks, always)
//!     → response written by Axum
//! ```

pub mod dispatcher;
pub mod exchange;
pub mod hooks;
pub mod server;

pub use dispatcher::Dispatcher;
pub use exchange::{Branch, Exchange};
pub use hooks::{Flow, Hook, HookPipeline, Stage};
pub use server::EdgeServer;
