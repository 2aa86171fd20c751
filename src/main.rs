//! Tunnel relay (v1)
//!
//! Republishes a locally hosted app, reachable only through a tunnel
//! endpoint, under the stable hostname of the hosting platform.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 TUNNEL RELAY                 │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│ security │──▶│  forward  │──┼──▶ Tunnel ──▶ App
//!                      │  │ server  │   │ headers  │   │ (routing) │  │
//!                      │  └─────────┘   └──────────┘   └─────┬─────┘  │
//!   Client Response    │  ┌─────────┐   ┌──────────┐         │        │
//!   ◀──────────────────┼──│response │◀──│ security │◀────────┘        │
//!                      │  └─────────┘   └──────────┘                  │
//!                      │                                              │
//!                      │  health (probe, /health, /status)            │
//!                      │  config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use tunnel_relay::config::load_config;
use tunnel_relay::lifecycle::{signals, Shutdown};
use tunnel_relay::observability::{logging, metrics};
use tunnel_relay::HttpServer;

#[derive(Parser)]
#[command(name = "tunnel-relay")]
#[command(about = "Relay a tunnelled local app under a stable hostname", long_about = None)]
struct Cli {
    /// Optional TOML file; environment variables override its values.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!(error = %e, "Configuration error, refusing to start");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("tunnel-relay v{} starting", env!("CARGO_PKG_VERSION"));

    // Builds the upstream, forwarder and prober; nothing is bound yet.
    let server = HttpServer::new(config.clone())?;

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        request_timeout_secs = config.timeouts.request_secs,
        probe_interval_secs = config.timeouts.probe_interval_secs,
        environment = %config.environment,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        // Validation already checked the address.
        match addr.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address"),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
