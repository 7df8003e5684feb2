//! Active health checking.
//!
//! # Responsibilities
//! - Periodically sweep every backend with a TCP probe
//! - Update backend liveness from the results

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::load_balancer::ServerPool;

pub struct HealthMonitor {
    pool: Arc<ServerPool>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(pool: Arc<ServerPool>, config: HealthCheckConfig) -> Self {
        Self { pool, config }
    }

    /// Sweep once per interval until shutdown. The first sweep happens one
    /// interval after start; backends begin alive.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        let interval = self.config.interval();
        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_secs = self.config.timeout_secs,
            "Health monitor starting"
        );

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn sweep(&self) {
        tracing::info!("Starting health check...");
        self.pool.health_check(self.config.timeout()).await;
        tracing::info!(
            alive = self.pool.alive_count(),
            total = self.pool.len(),
            "Health check completed"
        );
    }
}
