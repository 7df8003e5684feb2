//! Response handling and transformation.
//!
//! # Responsibilities
//! - Transform the upstream response for the client
//! - Build the load balancer's own error responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the upstream body
//! - Hop-by-hop headers stripped automatically
//! - Upstream status codes pass through verbatim

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

use crate::http::headers::strip_hop_by_hop;

/// Body sent with every 503 the load balancer produces itself.
pub const SERVICE_NOT_AVAILABLE: &str = "Service not available";

/// Convert an upstream response into one the client can receive.
pub fn from_upstream(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// 503 returned when no live backend can take the request.
pub fn service_unavailable() -> Response<Body> {
    (StatusCode::SERVICE_UNAVAILABLE, SERVICE_NOT_AVAILABLE).into_response()
}

/// 413 returned when the request body exceeds the buffering limit.
pub fn payload_too_large() -> Response<Body> {
    (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
}

/// 400 returned when the request body could not be read.
pub fn bad_request() -> Response<Body> {
    (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
}
