//! `/health` and `/status` endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::health::state::{HealthSnapshot, ProbeOutcome};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub tunnel: ProbeOutcome,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl From<&HealthSnapshot> for HealthReport {
    fn from(snapshot: &HealthSnapshot) -> Self {
        Self {
            status: if snapshot.success() { "healthy" } else { "unhealthy" },
            tunnel: snapshot.outcome,
            latency_ms: snapshot.latency.as_millis() as u64,
            upstream_status: snapshot.status_code,
        }
    }
}

/// Static facts about this process, captured at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pub upstream_url: String,
    pub listen_port: u16,
    pub request_timeout_secs: u64,
    pub environment: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub proxy_status: &'static str,
    #[serde(flatten)]
    pub process: ProcessInfo,
    pub last_probe_at: Option<String>,
    pub last_probe_success: Option<bool>,
    pub last_probe_latency_ms: Option<u64>,
    pub last_probe_outcome: Option<ProbeOutcome>,
}

/// Probe the upstream now; 200 when reachable, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let snapshot = state.prober.probe().await;
    let code = if snapshot.success() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(HealthReport::from(&snapshot)))
}

/// Diagnostics. Always 200 while the process is up.
pub async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    let latest = state.prober.state().latest();
    let latest = latest.as_deref();

    Json(StatusReport {
        proxy_status: "running",
        process: state.process.as_ref().clone(),
        last_probe_at: latest.map(|s| s.checked_at.to_rfc3339()),
        last_probe_success: latest.map(HealthSnapshot::success),
        last_probe_latency_ms: latest.map(|s| s.latency.as_millis() as u64),
        last_probe_outcome: latest.map(|s| s.outcome),
    })
}
