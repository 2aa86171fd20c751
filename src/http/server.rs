//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the local endpoints and the catch-all relay
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener with graceful shutdown
//! - Start the background health monitor

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, ProxyConfig};
use crate::health::handlers::{self, ProcessInfo};
use crate::health::{HealthMonitor, HealthState, Prober};
use crate::http::forward::Forwarder;
use crate::http::request::{ForwardedRequest, RelayRequestId, RequestIdExt, X_REQUEST_ID};
use crate::http::response::ForwardedResponse;
use crate::observability::metrics;
use crate::routing::Upstream;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub prober: Arc<Prober>,
    pub process: Arc<ProcessInfo>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    upstream: Arc<Upstream>,
    prober: Arc<Prober>,
}

impl HttpServer {
    /// Build the server. Fails if the upstream is unset or malformed, so a
    /// server that exists can always forward.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let upstream = Arc::new(Upstream::from_config(&config)?);

        let forwarder = Forwarder::new(upstream.clone(), &config)?;
        let prober = Arc::new(Prober::new(&upstream, &config, Arc::new(HealthState::new()))?);

        let process = Arc::new(ProcessInfo {
            upstream_url: upstream.redacted().to_string(),
            listen_port: config.listener.port,
            request_timeout_secs: config.timeouts.request_secs,
            environment: config.environment.clone(),
            version: env!("CARGO_PKG_VERSION"),
        });

        let state = AppState {
            forwarder,
            prober: prober.clone(),
            process,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            upstream,
            prober,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Only `GET /health` and `GET /status` are answered locally; other
    /// methods on those paths fall through to the relay.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health).fallback(proxy_handler))
            .route("/status", get(handlers::status).fallback(proxy_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, RelayRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.upstream,
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(
            self.prober.clone(),
            Duration::from_secs(self.config.timeouts.probe_interval_secs),
        );
        let monitor_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            monitor.run(monitor_shutdown).await;
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: relay the request to the upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = match state
        .forwarder
        .try_forward(ForwardedRequest::from_request(request))
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                upstream = %state.forwarder.upstream(),
                error = %err,
                "Upstream exchange failed"
            );
            metrics::record_upstream_error(err.code());
            ForwardedResponse::from_error(&err)
        }
    };

    metrics::record_request(&method, response.status.as_u16(), start_time);
    response.into_response()
}
