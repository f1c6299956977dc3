//! API routing subsystem.
//!
//! # Data Flow
//! ```text
//! Exchange (path under the API prefix)
//!     → request.rs (ApiRequest: body, auth, compression, SSE helpers)
//!     → router.rs (route lookup, handler invocation, failure → 500)
//!     → matcher.rs (exact method + path comparison)
//!     → reply.rs (JSON responses)
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable once serving
//! - No regex, no parameters, no trailing-slash normalization
//! - First match wins (registration order)

pub mod matcher;
pub mod reply;
pub mod request;
pub mod router;

pub use reply::{error_json, json, unauthorized, write_json, JsonBody};
pub use request::{ApiContext, ApiRequest};
pub use router::{ApiRouter, HandlerResult, Route};
