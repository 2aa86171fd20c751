//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream URL is present and usable
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before any listener is bound

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::routing::resolver::{has_dot_segment, parse_upstream};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("upstream URL is not set (expected UPSTREAM_URL)")]
    MissingUpstream,

    #[error("upstream URL is malformed: {0}")]
    InvalidUpstream(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("health probe path must start with '/' and have no dot segments: {0:?}")]
    InvalidProbePath(String),

    #[error("metrics address is not a socket address: {0:?}")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.upstream_url.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingUpstream),
        Some(raw) => {
            if let Err(reason) = parse_upstream(raw) {
                errors.push(ValidationError::InvalidUpstream(reason));
            }
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("request timeout"));
    }
    if config.timeouts.probe_secs == 0 {
        errors.push(ValidationError::Zero("probe timeout"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("max body size"));
    }
    let probe_path = &config.health.probe_path;
    if !probe_path.starts_with('/') || has_dot_segment(probe_path) {
        errors.push(ValidationError::InvalidProbePath(config.health.probe_path.clone()));
    }
    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
