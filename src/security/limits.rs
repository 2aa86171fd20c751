//! Request body limits.
//!
//! # Responsibilities
//! - Reject bodies whose declared Content-Length exceeds the limit
//! - Cut off streamed bodies that grow past the limit mid-flight
//!
//! # Design Decisions
//! - Bodies are streamed, never buffered whole
//! - The declared length is checked before the upstream is contacted
//! - A tripped limit is observable after the outbound call fails so the
//!   caller sees 413 instead of a generic upstream error

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use futures_util::{Stream, StreamExt};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raised inside the body stream once the limit is crossed.
#[derive(Debug, thiserror::Error)]
#[error("request body exceeds {limit} bytes")]
pub struct BodyTooLarge {
    pub limit: usize,
}

/// Content-Length as declared by the caller, if present and numeric.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Byte budget for one request body.
#[derive(Debug, Clone)]
pub struct BodyLimit {
    max: usize,
    tripped: Arc<AtomicBool>,
}

impl BodyLimit {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            tripped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// True if the declared length already breaks the limit.
    pub fn rejects_declared(&self, headers: &HeaderMap) -> bool {
        declared_length(headers).is_some_and(|len| len > self.max as u64)
    }

    /// True once a wrapped stream has produced more than `max` bytes.
    pub fn exceeded(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Wrap `body` so it errors out after `max` bytes.
    pub fn wrap(
        &self,
        body: Body,
    ) -> impl Stream<Item = Result<Bytes, BoxError>> + Send + 'static {
        let max = self.max;
        let tripped = self.tripped.clone();
        let mut seen = 0usize;

        body.into_data_stream().map(move |chunk: Result<Bytes, axum::Error>| -> Result<Bytes, BoxError> {
            let chunk = chunk.map_err(BoxError::from)?;
            seen = seen.saturating_add(chunk.len());
            if seen > max {
                tripped.store(true, Ordering::Release);
                return Err(BoxError::from(BodyTooLarge { limit: max }));
            }
            Ok(chunk)
        })
    }
}
