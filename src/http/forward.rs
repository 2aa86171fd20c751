//! Request forwarding to the upstream.
//!
//! # Responsibilities
//! - Build the outbound request (target URL, filtered headers, streamed body)
//! - Bound the wait for upstream response headers with the request timeout
//! - Map transport failures to 503/504/502, oversized bodies to 413 and
//!   dot-segment paths to 400
//!
//! # Design Decisions
//! - Stateless across requests; no retries (the caller owns retry policy)
//! - Redirects are relayed, never followed
//! - The timeout stops at the response headers; a body that is still
//!   streaming is relayed until the upstream finishes it
//! - Dropping the returned future (client went away) drops the outbound call

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use tokio::time;

use crate::config::{ConfigError, ProxyConfig};
use crate::error::ProxyError;
use crate::http::request::ForwardedRequest;
use crate::http::response::ForwardedResponse;
use crate::routing::resolver::has_dot_segment;
use crate::routing::Upstream;
use crate::security::{BodyLimit, HeaderPolicy};

/// Connection setup never waits longer than this, even with a larger request timeout.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Relays requests to the single configured upstream.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    upstream: Arc<Upstream>,
    policy: Arc<HeaderPolicy>,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(upstream: Arc<Upstream>, config: &ProxyConfig) -> Result<Self, ConfigError> {
        let request_timeout = config.timeouts.request();
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(request_timeout.min(MAX_CONNECT_TIMEOUT))
            .pool_idle_timeout(Duration::from_secs(90))
            .no_proxy()
            .build()?;

        let policy = Arc::new(HeaderPolicy::new(&upstream.authority()));

        Ok(Self {
            client,
            upstream,
            policy,
            request_timeout,
            max_body_bytes: config.limits.max_body_bytes,
        })
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Relay one request. Failures come back as `ProxyError` for the caller
    /// to log and render.
    pub async fn try_forward(
        &self,
        request: ForwardedRequest,
    ) -> Result<ForwardedResponse, ProxyError> {
        if has_dot_segment(&request.path) {
            return Err(ProxyError::InvalidPath(request.path));
        }

        let limit = BodyLimit::new(self.max_body_bytes);
        if limit.rejects_declared(&request.headers) {
            return Err(ProxyError::OversizedBody { limit: limit.max() });
        }

        let target = self
            .upstream
            .target_url(&request.path, request.query.as_deref());
        let headers = self.policy.outbound(&request.headers, request.client_addr);

        // Zero-length bodies still go out, as an explicit empty body.
        let body = if request.has_empty_body() {
            reqwest::Body::from(Bytes::new())
        } else {
            reqwest::Body::wrap_stream(limit.wrap(request.body))
        };

        tracing::info!(
            method = %request.method,
            path = %request.path,
            upstream = %self.upstream,
            "Proxying request"
        );

        let send = self
            .client
            .request(request.method, target)
            .headers(headers)
            .body(body)
            .send();

        // Dropping `send` on expiry closes the upstream connection.
        let result = time::timeout(self.request_timeout, send).await;

        if limit.exceeded() {
            return Err(ProxyError::OversizedBody { limit: limit.max() });
        }

        match result {
            Ok(Ok(response)) => Ok(ForwardedResponse::from_upstream(response, &self.policy)),
            Ok(Err(e)) => Err(ProxyError::from_upstream(e, self.request_timeout)),
            Err(_elapsed) => Err(ProxyError::UpstreamTimeout(self.request_timeout)),
        }
    }
}
