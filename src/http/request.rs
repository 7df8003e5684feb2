//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4)
//! - Buffer the inbound request so failed forwards can be replayed
//! - Rebuild the request for a specific upstream
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The buffered request is immutable; every forwarding try gets a fresh copy

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::{request::Parts, HeaderMap, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::forward::UpstreamTarget;
use crate::http::headers::{append_forwarded_for, strip_hop_by_hop};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// An inbound request with its body held in memory.
#[derive(Debug, Clone)]
pub struct BufferedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl BufferedRequest {
    pub fn new(parts: Parts, body: Bytes, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            remote_addr,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// The request ID assigned by the middleware, or "unknown".
    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }

    /// Build the request sent to `target`.
    ///
    /// Only scheme, authority and the path prefix change; method, headers
    /// (minus hop-by-hop) and body are carried over.
    pub fn to_upstream(&self, target: &UpstreamTarget) -> Result<Request<Body>, axum::http::Error> {
        let path = join_paths(target.base_path(), self.uri.path());
        let path_and_query = match self.uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        let uri = Uri::builder()
            .scheme(target.scheme().clone())
            .authority(target.authority().clone())
            .path_and_query(path_and_query)
            .build()?;

        let mut headers = self.headers.clone();
        strip_hop_by_hop(&mut headers);
        if let Some(remote) = self.remote_addr {
            append_forwarded_for(&mut headers, remote);
        }

        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(uri)
            .body(Body::from(self.body.clone()))?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}

/// Join an upstream base path and a request path with exactly one slash.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}
