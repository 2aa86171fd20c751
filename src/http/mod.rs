//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → GET /health, GET /status → health::handlers
//!     → anything else:
//!         → request.rs (ForwardedRequest: method, path, raw query, headers, body)
//!         → forward.rs (outbound call to the upstream)
//!         → response.rs (relay or synthesize, then send to client)
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{ForwardedRequest, RelayRequestId, RequestIdExt, X_REQUEST_ID};
pub use response::ForwardedResponse;
pub use server::{AppState, HttpServer};
