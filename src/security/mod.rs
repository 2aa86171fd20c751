//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (declared and streamed body size)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → Pass to the forwarder
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop, tag with relay identity)
//! ```
//!
//! # Design Decisions
//! - Header policy is pure and deterministic
//! - Oversized bodies fail closed with 413

pub mod headers;
pub mod limits;

pub use headers::HeaderPolicy;
pub use limits::BodyLimit;
