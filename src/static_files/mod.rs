//! Static asset serving.
//!
//! # Data Flow
//! ```text
//! request path (outside the API prefix)
//!     → resolver.rs (decode, index file, confine to root)
//!     → mime.rs (content type, compressible?)
//!     → compression (optional)
//!     → response with Content-Type / Content-Length / Content-Encoding
//! ```

pub mod mime;
pub mod resolver;

pub use resolver::StaticFiles;
