//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the load-balancing handler
//! - Wire up middleware (tracing, request ID)
//! - Buffer request bodies so failed forwards can be replayed
//! - Spawn the health monitor next to the server
//! - Serve until the shutdown signal

use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::LbConfig;
use crate::health::HealthMonitor;
use crate::http::request::{BufferedRequest, UuidRequestId};
use crate::http::response::{bad_request, payload_too_large};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{PoolError, ServerPool};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::routing::Router as ProxyRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub max_body_bytes: usize,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    app: Router,
    config: LbConfig,
    pool: Arc<ServerPool>,
}

impl HttpServer {
    /// Build the pool from `config` and wire the server around it.
    pub fn new(config: LbConfig) -> Result<Self, PoolError> {
        let pool = Arc::new(ServerPool::from_config(&config)?);
        Ok(Self::with_pool(config, pool))
    }

    /// Wire the server around an already built pool.
    pub fn with_pool(config: LbConfig, pool: Arc<ServerPool>) -> Self {
        let router = Arc::new(ProxyRouter::new(
            pool.clone(),
            RetryPolicy::from_config(&config.retries),
        ));
        let state = AppState {
            router,
            max_body_bytes: config.limits.max_body_bytes,
        };

        Self {
            app: Self::build_router(state),
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(lb_handler))
            .route("/", any(lb_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "Load balancer started"
        );

        let monitor = HealthMonitor::new(self.pool.clone(), self.config.health_check.clone());
        tokio::spawn(monitor.run(shutdown.resubscribe()));

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(Shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Load-balancing handler: buffer, then route with retries and failover.
async fn lb_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    let start_time = Instant::now();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let response = if exceeds_limit(&e) {
                tracing::warn!(
                    remote_addr = ?remote_addr,
                    path = %parts.uri.path(),
                    limit = state.max_body_bytes,
                    "Request body over limit"
                );
                payload_too_large()
            } else {
                tracing::warn!(
                    remote_addr = ?remote_addr,
                    path = %parts.uri.path(),
                    error = %e,
                    "Failed to read request body"
                );
                bad_request()
            };
            metrics::record_request(response.status().as_u16(), start_time);
            return response;
        }
    };

    let request = BufferedRequest::new(parts, body, remote_addr);
    tracing::debug!(
        request_id = %request.request_id(),
        method = %request.method(),
        path = %request.path(),
        "Proxying request"
    );

    let response = state.router.route(&request).await;
    metrics::record_request(response.status().as_u16(), start_time);
    response
}

/// Whether a body error came from the buffering limit rather than the client stream.
fn exceeds_limit(error: &axum::Error) -> bool {
    let mut source = error.source();
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}
