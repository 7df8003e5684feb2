//! Request router.
//!
//! # Responsibilities
//! - Refuse requests that used up their attempt budget
//! - Pick the next live backend from the pool
//! - Turn a rejection into the client-facing 503

use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use thiserror::Error;

use crate::http::request::BufferedRequest;
use crate::http::response::service_unavailable;
use crate::load_balancer::{Backend, ServerPool};
use crate::resilience::failover;
use crate::resilience::retries::{RequestCounters, RetryPolicy};

/// Why a request was answered by the load balancer instead of an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("max attempts reached")]
    AttemptsExhausted,

    #[error("no live backend available")]
    NoPeerAvailable,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response<Body> {
        service_unavailable()
    }
}

/// Routes requests over a shared pool.
#[derive(Debug)]
pub struct Router {
    pool: Arc<ServerPool>,
    policy: RetryPolicy,
}

impl Router {
    pub fn new(pool: Arc<ServerPool>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Choose the backend for the next attempt of `request`.
    ///
    /// The pool is not consulted once the attempt ceiling is passed.
    pub fn select(
        &self,
        request: &BufferedRequest,
        counters: &RequestCounters,
    ) -> Result<&Backend, Rejection> {
        if !self.policy.admits(counters) {
            tracing::warn!(
                request_id = %request.request_id(),
                remote_addr = ?request.remote_addr(),
                path = %request.path(),
                attempts = counters.attempts,
                retries = counters.retries,
                max_tries = self.policy.max_forward_tries(),
                "Max attempts reached, terminating"
            );
            return Err(Rejection::AttemptsExhausted);
        }

        self.pool.get_next_peer().ok_or_else(|| {
            tracing::warn!(
                request_id = %request.request_id(),
                path = %request.path(),
                backends = self.pool.len(),
                "No live backend available"
            );
            Rejection::NoPeerAvailable
        })
    }

    /// Forward `request`, retrying and rerouting as needed.
    pub async fn route(&self, request: &BufferedRequest) -> Response<Body> {
        match failover::dispatch(self, request).await {
            Ok(response) => response,
            Err(rejection) => rejection.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::testing::{backend, backend_with, request, ScriptedTransport};
    use axum::http::StatusCode;

    fn router(n: usize) -> Router {
        let mut pool = ServerPool::new();
        for i in 0..n {
            pool.add_backend(backend(&format!("http://10.0.0.{}:80", i)));
        }
        Router::new(Arc::new(pool), RetryPolicy::default())
    }

    #[test]
    fn test_select_round_robin() {
        let router = router(3);
        let counters = RequestCounters::default();
        let req = request("/");
        let hosts: Vec<_> = (0..3)
            .map(|_| router.select(&req, &counters).unwrap().url().host_str().unwrap().to_string())
            .collect();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.0"]);
    }

    #[test]
    fn test_exhausted_attempts_skip_pool() {
        let router = router(3);
        let counters = RequestCounters { attempts: 4, retries: 0 };

        let err = router.select(&request("/"), &counters).unwrap_err();

        assert_eq!(err, Rejection::AttemptsExhausted);
        // Cursor untouched: the next selection still starts at index 1
        let next = router.select(&request("/"), &RequestCounters::default()).unwrap();
        assert_eq!(next.url().host_str(), Some("10.0.0.1"));
    }

    #[test]
    fn test_no_peer() {
        let router = router(2);
        for b in router.pool().backends() {
            b.set_alive(false);
        }
        let err = router.select(&request("/"), &RequestCounters::default()).unwrap_err();
        assert_eq!(err, Rejection::NoPeerAvailable);
    }

    #[tokio::test]
    async fn test_rejection_is_503() {
        let router = router(1);
        router.pool().backends()[0].set_alive(false);

        let response = router.route(&request("/")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_route_returns_upstream_response() {
        let transport = ScriptedTransport::responding(StatusCode::CREATED);
        let mut pool = ServerPool::new();
        pool.add_backend(backend_with("http://10.0.0.9:80", &transport));
        let router = Router::new(Arc::new(pool), RetryPolicy::default());

        let response = router.route(&request("/items")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(transport.tries(), 1);
    }
}
