//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) unless the caller supplied one
//! - Capture everything needed to replay the request upstream
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The raw query string is kept verbatim
//! - The body stays a stream; nothing is buffered here

use std::net::SocketAddr;

use axum::{
    body::{Body, HttpBody},
    extract::ConnectInfo,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayRequestId;

impl MakeRequestId for RelayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Convenience accessor for the request ID header.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// One inbound call, ready to be relayed.
#[derive(Debug)]
pub struct ForwardedRequest {
    pub method: Method,
    pub path: String,
    /// Raw query string, exactly as received.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Body,
    pub client_addr: Option<SocketAddr>,
}

impl ForwardedRequest {
    /// Take apart an axum request. The peer address comes from `ConnectInfo`
    /// when the server was started with it.
    pub fn from_request(request: Request<Body>) -> Self {
        let client_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        let (parts, body) = request.into_parts();

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
            client_addr,
        }
    }

    /// True when the body is known to carry no bytes.
    pub fn has_empty_body(&self) -> bool {
        self.body.size_hint().exact() == Some(0)
    }
}
