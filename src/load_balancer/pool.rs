//! Backend pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered set of backends
//! - Select the next live peer via the shared rotation cursor
//! - Apply liveness updates from failover and health sweeps

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::validation::{parse_backend_url, ValidationError};
use crate::config::LbConfig;
use crate::health::probe::is_backend_alive;
use crate::http::forward::ForwardError;
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin};
use crate::observability::metrics;

/// Error building a pool from configuration.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    InvalidBackend(#[from] ValidationError),

    #[error("failed to create transport: {0}")]
    Transport(#[from] ForwardError),
}

/// The set of upstreams plus the rotation cursor.
///
/// Backends can only be added while the pool is exclusively owned; once it is
/// shared behind an `Arc` the set is frozen.
#[derive(Debug, Default)]
pub struct ServerPool {
    backends: Vec<Backend>,
    rotation: RoundRobin,
}

impl ServerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from validated configuration, in configured order.
    pub fn from_config(config: &LbConfig) -> Result<Self, PoolError> {
        let mut pool = Self::new();
        for address in &config.backends {
            let url = parse_backend_url(address)?;
            pool.add_backend(Backend::new(url, &config.timeouts)?);
        }
        Ok(pool)
    }

    /// Start the rotation cursor at `cursor` instead of zero.
    pub fn with_cursor(mut self, cursor: u64) -> Self {
        self.rotation = RoundRobin::starting_at(cursor);
        self
    }

    pub fn add_backend(&mut self, backend: Backend) {
        tracing::info!(backend = %backend.url(), "Configured server");
        metrics::record_backend_health(backend.url().as_str(), backend.is_alive());
        self.backends.push(backend);
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_alive()).count()
    }

    /// Advance the shared cursor and return it modulo the pool size.
    pub fn next_index(&self) -> usize {
        self.rotation.next_index(self.backends.len())
    }

    /// Next alive backend in rotation, or `None` if every backend is dead.
    pub fn get_next_peer(&self) -> Option<&Backend> {
        self.rotation.next_alive(&self.backends)
    }

    /// Set liveness of the backend whose URL equals `url`. No-op if absent.
    pub fn mark_backend_status(&self, url: &Url, alive: bool) {
        if let Some(backend) = self.backends.iter().find(|b| b.url() == url) {
            backend.set_alive(alive);
            metrics::record_backend_health(backend.url().as_str(), alive);
        }
    }

    /// Probe every backend in order and record the result.
    ///
    /// Runs to completion; each probe is bounded by `timeout`.
    pub async fn health_check(&self, timeout: Duration) {
        for backend in &self.backends {
            let alive = is_backend_alive(backend.url(), timeout).await;
            backend.set_alive(alive);
            metrics::record_backend_health(backend.url().as_str(), alive);

            let status = if alive { "up" } else { "down" };
            tracing::info!("{} [{}]", backend.url(), status);
        }
    }
}
