//! Tunnel relay library.
//!
//! Republishes an application reached through a tunnel endpoint under a
//! stable hostname: every request is relayed to the configured upstream,
//! and `/health` and `/status` report on it.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Upstream;
