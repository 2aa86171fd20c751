//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health (handlers.rs):
//!     → active.rs probes the upstream now
//!     → state.rs records the result
//!     → 200 if reachable, 503 otherwise
//!
//! Periodic monitor (active.rs, optional):
//!     Timer → probe → state.rs
//!
//! GET /status (handlers.rs):
//!     → reads state.rs + process info, always 200
//! ```
//!
//! # Design Decisions
//! - Probes use their own client and timeout, never forwarded traffic
//! - One shared snapshot, swapped atomically

pub mod active;
pub mod handlers;
pub mod state;

pub use active::{HealthMonitor, Prober};
pub use state::{HealthSnapshot, HealthState, ProbeOutcome};
