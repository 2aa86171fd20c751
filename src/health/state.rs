//! Upstream health state shared across handlers.
//!
//! # Semantics
//! - Holds the most recent probe result, or nothing before the first probe
//! - Readers get an immutable snapshot without locking
//! - A snapshot older than the stored one is discarded (last-write-wins by
//!   probe timestamp)
//!
//! # Design Decisions
//! - `ArcSwapOption` instead of a lock: updates are small and rare,
//!   reads happen on every `/health` and `/status`
//! - No persistence: state is lost on restart

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Upstream answered with a non-5xx status.
    Connected,
    /// Upstream (or the tunnel in front of it) answered 5xx.
    RespondingWithError,
    /// Connection refused, DNS failure, or broken exchange.
    NotAccessible,
    /// No answer within the probe timeout.
    Timeout,
}

impl ProbeOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, ProbeOutcome::Connected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProbeOutcome::Connected => "connected",
            ProbeOutcome::RespondingWithError => "responding_with_error",
            ProbeOutcome::NotAccessible => "not_accessible",
            ProbeOutcome::Timeout => "timeout",
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub checked_at: DateTime<Utc>,
    pub outcome: ProbeOutcome,
    pub latency: Duration,
    /// Status code returned by the upstream, if it answered at all.
    pub status_code: Option<u16>,
}

impl HealthSnapshot {
    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Process-wide holder for the latest probe result.
#[derive(Debug, Default)]
pub struct HealthState {
    latest: ArcSwapOption<HealthSnapshot>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` unless a newer one is already recorded.
    pub fn record(&self, snapshot: HealthSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.latest.rcu(|current| match current {
            Some(existing) if existing.checked_at > snapshot.checked_at => Some(existing.clone()),
            _ => Some(snapshot.clone()),
        });
    }

    /// The most recent probe result, if any probe has run.
    pub fn latest(&self) -> Option<Arc<HealthSnapshot>> {
        self.latest.load_full()
    }
}
