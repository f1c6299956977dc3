//! Response compression subsystem.
//!
//! # Data Flow
//! ```text
//! Accept-Encoding header
//!     → negotiate.rs (pick at most one of br / gzip / deflate)
//!     → codec.rs (compress the buffered body off the async threads)
//!     → caller sets Content-Encoding and writes headers + bytes together
//! ```
//!
//! # Design Decisions
//! - Fixed priority brotli > gzip > deflate; client ordering and q-weights
//!   other than `q=0` are ignored
//! - Selection happens once per response, before any header is written
//! - A codec failure falls back to the raw body, never a half-encoded one

pub mod codec;
pub mod negotiate;

pub use codec::Compressor;
pub use negotiate::{negotiate, Encoding};
