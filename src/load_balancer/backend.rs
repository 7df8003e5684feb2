//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track liveness (alive/dead)
//! - Own the transport that forwards to this upstream

use std::fmt;
use std::sync::{PoisonError, RwLock};

use axum::body::Body;
use axum::http::Response;
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::forward::{Forward, ForwardError, HttpForwarder};
use crate::http::request::BufferedRequest;

/// A single upstream server.
pub struct Backend {
    /// Upstream URL; also the backend's identity within the pool.
    url: Url,
    /// Liveness flag. Read on every selection, written by health sweeps and failover.
    alive: RwLock<bool>,
    /// Transport bound to `url`, owned by this backend alone.
    transport: Box<dyn Forward>,
}

impl Backend {
    /// Create a backend forwarding over HTTP. Starts alive.
    pub fn new(url: Url, timeouts: &TimeoutConfig) -> Result<Self, ForwardError> {
        let transport = HttpForwarder::new(&url, timeouts)?;
        Ok(Self::with_transport(url, transport))
    }

    /// Create a backend with a custom transport. Starts alive.
    pub fn with_transport(url: Url, transport: impl Forward + 'static) -> Self {
        Self {
            url,
            alive: RwLock::new(true),
            transport: Box::new(transport),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn set_alive(&self, alive: bool) {
        // A poisoned lock still holds a valid bool
        *self.alive.write().unwrap_or_else(PoisonError::into_inner) = alive;
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forward one try of `request` to this upstream.
    pub async fn forward(&self, request: &BufferedRequest) -> Result<Response<Body>, ForwardError> {
        self.transport.forward(request).await
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.url.as_str())
            .field("alive", &self.is_alive())
            .finish()
    }
}
