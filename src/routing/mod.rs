//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, raw query)
//!     → resolver.rs (upstream base + path + query)
//!     → Target URL handed to the forwarder
//! ```
//!
//! # Design Decisions
//! - Single upstream: every path that is not a local endpoint is forwarded
//! - Resolved once at startup, immutable at runtime
//! - Deterministic: same input always yields the same target

pub mod resolver;

pub use resolver::Upstream;
