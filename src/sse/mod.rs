//! Server-Sent Events.
//!
//! # Data Flow
//! ```text
//! handler
//!     → SseSession::open (headers fixed, streaming body returned as the response)
//!     → session.send / heartbeat (frames queued in order on a bounded channel)
//!     → body stream drains the channel to the connection
//! peer disconnect → body dropped → channel closed → send() fails, closed() resolves
//! ```
//!
//! # Design Decisions
//! - One session per response, owned by the handler that opened it
//! - Frames are never reordered or batched; the channel is FIFO
//! - Keep-alive tasks hold only a weak sender so `close()` really ends the stream

pub mod session;

pub use session::{format_event, SseSession, HEARTBEAT_FRAME};
