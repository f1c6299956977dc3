//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (optional per-client before-hook, 429 on excess)
//!     → API handler
//!         → auth.rs (extract Basic / Bearer credentials)
//!         → rate_limit.rs (shared limiter for sensitive actions, e.g. logins)
//! ```
//!
//! # Design Decisions
//! - Credential extraction never fails loudly: absent or malformed → `None`
//! - Limiter state is explicit (owned by the API router), not global
//! - Limiter expiry is lazy with an optional background sweep

pub mod auth;
pub mod rate_limit;

pub use auth::{basic_auth, bearer_auth, BasicCredentials};
pub use rate_limit::{Clock, ManualClock, RateLimitHook, RateLimiter, SystemClock};
