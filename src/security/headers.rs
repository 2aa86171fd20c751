//! Header manipulation for both legs of the relay.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers (static list plus anything named by `Connection`)
//! - Drop `Host` so the outbound client derives it from the target URL
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host and `Via`
//! - Tag responses with the relay name and the upstream authority
//!
//! # Design Decisions
//! - Pure functions over `HeaderMap`: no I/O, no shared state
//! - Duplicate headers keep their relative order
//! - The upstream is identified by authority only, never by credentials

use std::net::SocketAddr;

use axum::http::{
    header::{self, HeaderName, HeaderValue},
    HeaderMap,
};

/// Token used in `Via` and `x-proxied-by`.
pub const RELAY_NAME: &str = "tunnel-relay";

pub const X_PROXIED_BY: HeaderName = HeaderName::from_static("x-proxied-by");
pub const X_UPSTREAM_HOST: HeaderName = HeaderName::from_static("x-upstream-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Headers that only describe a single connection leg.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Returns true for headers that must never cross the relay.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Header names listed in `Connection` values (e.g. `Connection: close, x-foo`).
fn connection_tokens(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Copy `headers` minus hop-by-hop entries and anything in `also_drop`.
fn copy_end_to_end(headers: &HeaderMap, also_drop: &[HeaderName]) -> HeaderMap {
    let listed = connection_tokens(headers);
    let mut out = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers.iter() {
        if is_hop_by_hop(name) || listed.contains(name) || also_drop.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }

    out
}

fn append_via(headers: &mut HeaderMap) {
    headers.append(header::VIA, HeaderValue::from_static("1.1 tunnel-relay"));
}

/// Header rewriting rules for one upstream.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    upstream_host: Option<HeaderValue>,
}

impl HeaderPolicy {
    /// `upstream_authority` is the `host[:port]` advertised in responses.
    pub fn new(upstream_authority: &str) -> Self {
        Self {
            upstream_host: HeaderValue::from_str(upstream_authority).ok(),
        }
    }

    /// Rewrite caller headers for the request sent to the upstream.
    pub fn outbound(&self, headers: &HeaderMap, client: Option<SocketAddr>) -> HeaderMap {
        let mut out = copy_end_to_end(
            headers,
            &[header::HOST, X_FORWARDED_FOR, X_FORWARDED_HOST],
        );

        // Existing X-Forwarded-For chain plus the immediate peer.
        let mut chain: Vec<String> = headers
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        if let Some(addr) = client {
            chain.push(addr.ip().to_string());
        }
        if !chain.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&chain.join(", ")) {
                out.insert(X_FORWARDED_FOR, value);
            }
        }

        if let Some(host) = headers
            .get(X_FORWARDED_HOST)
            .or_else(|| headers.get(header::HOST))
        {
            out.insert(X_FORWARDED_HOST, host.clone());
        }

        // The hosting platform terminates TLS and usually sets this already.
        if !out.contains_key(X_FORWARDED_PROTO) {
            out.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
        }

        append_via(&mut out);
        out
    }

    /// Rewrite upstream response headers for the caller.
    pub fn inbound(&self, headers: &HeaderMap) -> HeaderMap {
        let mut out = copy_end_to_end(headers, &[]);

        append_via(&mut out);
        out.insert(X_PROXIED_BY, HeaderValue::from_static(RELAY_NAME));
        if let Some(host) = &self.upstream_host {
            out.insert(X_UPSTREAM_HOST, host.clone());
        }

        out
    }
}
