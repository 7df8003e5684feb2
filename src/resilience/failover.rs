//! Failover controller.
//!
//! # State Machine
//! ```text
//! Routing ──peer──▶ Forwarding ──response──▶ done
//!    │                 │   ▲
//!    │          failure│   │ retries_on_peer < max_retries
//!    │                 ▼   │ (sleep retry_delay)
//!    │              RetrySame
//!    │                 │ retries_on_peer >= max_retries
//!    │                 ▼
//!    │◀──attempts+1── Rerouting (mark backend dead)
//!    │
//!    └─attempts exhausted / no live peer──▶ Rejected (503)
//! ```
//!
//! The two counters are the only state carried between iterations, so the
//! number of forwarding tries per request is bounded by
//! `(max_attempts + 1) * (max_retries + 1)`.

use axum::body::Body;
use axum::http::Response;

use crate::http::request::BufferedRequest;
use crate::load_balancer::Backend;
use crate::observability::metrics;
use crate::resilience::retries::{RequestCounters, Step};
use crate::routing::router::{Rejection, Router};

enum State<'p> {
    Routing,
    Forwarding { peer: &'p Backend, retries_on_peer: u32 },
    Rerouting { peer: &'p Backend },
}

/// Drive one request through routing, retries and reroutes until it gets an
/// upstream response or is rejected.
pub async fn dispatch(
    router: &Router,
    request: &BufferedRequest,
) -> Result<Response<Body>, Rejection> {
    let policy = router.policy();
    let mut counters = RequestCounters::default();
    let mut state = State::Routing;

    loop {
        state = match state {
            State::Routing => State::Forwarding {
                peer: router.select(request, &counters)?,
                retries_on_peer: 0,
            },

            State::Forwarding { peer, retries_on_peer } => match peer.forward(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        request_id = %request.request_id(),
                        backend = %peer.url(),
                        retries = counters.retries,
                        error = %e,
                        "Forwarding error"
                    );
                    metrics::record_forward_error(peer.url().as_str());

                    match policy.on_forward_error(retries_on_peer) {
                        Step::RetrySame(delay) => {
                            tokio::time::sleep(delay).await;
                            counters.retries += 1;
                            State::Forwarding {
                                peer,
                                retries_on_peer: retries_on_peer + 1,
                            }
                        }
                        Step::Reroute => State::Rerouting { peer },
                    }
                }
            },

            State::Rerouting { peer } => {
                router.pool().mark_backend_status(peer.url(), false);
                counters.attempts += 1;
                tracing::info!(
                    request_id = %request.request_id(),
                    remote_addr = ?request.remote_addr(),
                    path = %request.path(),
                    backend = %peer.url(),
                    attempt = counters.attempts,
                    "Backend marked down, attempting retry"
                );
                State::Routing
            }
        };
    }
}
