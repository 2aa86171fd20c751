//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn an upstream reply into a response for the caller
//! - Synthesize 400/413/502/503/504 responses for failed exchanges
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped by the header policy
//! - Synthesized responses are plain text and carry `x-proxy-error`

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::{ProxyError, X_PROXY_ERROR};
use crate::security::headers::{HeaderPolicy, RELAY_NAME, X_PROXIED_BY};

/// What goes back to the caller.
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl ForwardedResponse {
    /// Relay an upstream reply: status verbatim, headers through the
    /// inbound policy, body streamed.
    pub fn from_upstream(response: reqwest::Response, policy: &HeaderPolicy) -> Self {
        let status = response.status();
        let headers = policy.inbound(response.headers());
        let body = Body::from_stream(response.bytes_stream());

        Self {
            status,
            headers,
            body,
        }
    }

    /// Build the diagnostic response for a failed exchange.
    pub fn from_error(err: &ProxyError) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(X_PROXY_ERROR, HeaderValue::from_static(err.code()));
        headers.insert(X_PROXIED_BY, HeaderValue::from_static(RELAY_NAME));

        Self {
            status: err.status_code(),
            headers,
            body: Body::from(err.client_message()),
        }
    }
}

impl IntoResponse for ForwardedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        ForwardedResponse::from_error(&self).into_response()
    }
}
