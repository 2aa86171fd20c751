//! Active health checking.
//!
//! # Responsibilities
//! - Probe the upstream with a lightweight GET on a dedicated client
//! - Record every result into the shared `HealthState`
//! - Optionally probe on a fixed period until shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time;
use url::Url;

use crate::config::{ConfigError, ProxyConfig};
use crate::error::describe;
use crate::health::state::{HealthSnapshot, HealthState, ProbeOutcome};
use crate::observability::metrics;
use crate::routing::Upstream;

/// Issues reachability probes against the upstream.
pub struct Prober {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
    state: Arc<HealthState>,
}

impl Prober {
    pub fn new(
        upstream: &Upstream,
        config: &ProxyConfig,
        state: Arc<HealthState>,
    ) -> Result<Self, ConfigError> {
        let timeout = config.timeouts.probe();
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .no_proxy()
            .user_agent(concat!("tunnel-relay-health-check/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: upstream.target_url(&config.health.probe_path, None),
            timeout,
            state,
        })
    }

    pub fn state(&self) -> &Arc<HealthState> {
        &self.state
    }

    /// Probe once, record the result, and return it.
    pub async fn probe(&self) -> HealthSnapshot {
        let started = Instant::now();
        let result = self.client.get(self.url.clone()).send().await;
        let latency = started.elapsed();

        let (outcome, status_code) = match result {
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() {
                    tracing::warn!(status = %status, "Health probe failed: upstream responding with error");
                    (ProbeOutcome::RespondingWithError, Some(status.as_u16()))
                } else {
                    (ProbeOutcome::Connected, Some(status.as_u16()))
                }
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(timeout = ?self.timeout, "Health probe failed: timeout");
                (ProbeOutcome::Timeout, None)
            }
            Err(e) => {
                tracing::warn!(error = %describe(e), "Health probe failed: upstream not accessible");
                (ProbeOutcome::NotAccessible, None)
            }
        };

        let snapshot = HealthSnapshot {
            checked_at: Utc::now(),
            outcome,
            latency,
            status_code,
        };

        metrics::record_probe(snapshot.success(), latency);
        self.state.record(snapshot.clone());
        snapshot
    }
}

/// Background task that probes on a fixed period.
pub struct HealthMonitor {
    prober: Arc<Prober>,
    interval: Duration,
}

impl HealthMonitor {
    /// `interval` of zero disables the monitor.
    pub fn new(prober: Arc<Prober>, interval: Duration) -> Self {
        Self { prober, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::info!("Background health probes disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.prober.probe().await;
                    tracing::debug!(
                        outcome = snapshot.outcome.as_str(),
                        latency_ms = snapshot.latency.as_millis() as u64,
                        "Health probe complete"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
