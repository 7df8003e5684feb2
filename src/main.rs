//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌──────────────────────────────────────────────────────┐
//!     ───────────────────┼─▶ http::server ──▶ routing::Router ──▶ ServerPool    │
//!                        │       ▲                  ▲               │ next peer │
//!                        │       │                  │ reroute       ▼           │
//!     Client Response    │       │        resilience::failover ◀── Backend ─────┼──▶ Upstream
//!     ◀──────────────────┼───────┘             (retry same)                     │
//!                        │                                                      │
//!                        │   health::HealthMonitor ──(TCP probe every 20s)──▶   │
//!                        │   sets Backend liveness                              │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use simple_lb::config::loader::read_config;
use simple_lb::config::validation::validate_config;
use simple_lb::config::{ConfigError, LbConfig};
use simple_lb::lifecycle::{signals, Shutdown};
use simple_lb::observability::{logging, metrics};
use simple_lb::HttpServer;

#[derive(Parser)]
#[command(name = "simple-lb")]
#[command(about = "Round-robin HTTP load balancer with health checks and failover", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load balanced backends, use commas to separate.
    #[arg(short, long, value_delimiter = ',')]
    backends: Vec<String>,

    /// Port to serve on all interfaces.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Load the file (if any) and layer flags on top.
    fn into_config(self) -> Result<LbConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => LbConfig::default(),
        };

        if !self.backends.is_empty() {
            config.backends = self
                .backends
                .into_iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect();
        }
        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{}", port);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability.log_level);

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err(ConfigError::Validation(errors).into());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        health_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if let Err(e) = signals::wait_for_signal().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signals");
            // Keep the sender alive; dropping it would read as a shutdown
            std::future::pending::<()>().await;
        }
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
