//! Per-request failures and their HTTP representation.
//!
//! Every variant becomes a short `text/plain` response tagged with an
//! `x-proxy-error` code. None of them are fatal to the process.

use std::error::Error as _;
use std::time::Duration;

use axum::http::{HeaderName, StatusCode};

pub const X_PROXY_ERROR: HeaderName = HeaderName::from_static("x-proxy-error");

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Connection refused, DNS failure, TLS handshake failure.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// No complete answer within the request timeout.
    #[error("upstream timed out after {}s", .0.as_secs())]
    UpstreamTimeout(Duration),

    /// Request body larger than the configured limit.
    #[error("request body exceeds {limit} bytes")]
    OversizedBody { limit: usize },

    /// Request path carries `.` or `..` segments.
    #[error("request path contains dot segments: {0}")]
    InvalidPath(String),

    /// Anything else that broke the exchange with the upstream.
    #[error("upstream request failed: {0}")]
    UpstreamFailure(String),
}

impl ProxyError {
    /// Classify a transport error from the outbound client.
    pub fn from_upstream(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProxyError::UpstreamTimeout(timeout)
        } else if err.is_connect() {
            ProxyError::UpstreamUnreachable(describe(err))
        } else {
            ProxyError::UpstreamFailure(describe(err))
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::OversizedBody { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Value for the `x-proxy-error` header.
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnreachable(_) => "UPSTREAM_UNREACHABLE",
            ProxyError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            ProxyError::OversizedBody { .. } => "OVERSIZED_BODY",
            ProxyError::InvalidPath(_) => "INVALID_PATH",
            ProxyError::UpstreamFailure(_) => "UPSTREAM_FAILURE",
        }
    }

    /// Body shown to the caller. Transport details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            ProxyError::UpstreamUnreachable(_) => "Upstream is not accessible. Ensure the local app \
                 is running and the tunnel is active."
                .to_string(),
            ProxyError::UpstreamTimeout(timeout) => format!(
                "Request timeout. The upstream did not respond within {} seconds.",
                timeout.as_secs()
            ),
            ProxyError::OversizedBody { limit } => {
                format!("Request body too large. The limit is {limit} bytes.")
            }
            ProxyError::InvalidPath(_) => {
                "Request path must not contain '.' or '..' segments.".to_string()
            }
            ProxyError::UpstreamFailure(_) => "Upstream request failed.".to_string(),
        }
    }
}

/// Render an error and its causes on one line. The URL is dropped because
/// it may carry upstream credentials.
pub fn describe(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
