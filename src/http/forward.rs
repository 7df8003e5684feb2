//! Upstream forwarding transport.
//!
//! # Responsibilities
//! - Define the `Forward` seam a Backend delegates to
//! - Send a buffered request to one upstream over a hyper client
//! - Classify transport-level failures as `ForwardError`
//!
//! # Design Decisions
//! - One client per backend; transports are never shared
//! - Any HTTP response, 5xx included, is a success at this layer
//! - Each try is bounded by the request timeout

use std::str::FromStr;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::Response;
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::request::BufferedRequest;
use crate::http::response::from_upstream;

/// Transport-level failure talking to one upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream target `{0}`")]
    InvalidTarget(String),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("{0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

/// Sends a request to the upstream a Backend is bound to.
pub trait Forward: Send + Sync {
    fn forward<'a>(
        &'a self,
        request: &'a BufferedRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>>;
}

/// Scheme, authority and base path of an upstream, pre-parsed for URI rewriting.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
}

impl UpstreamTarget {
    pub fn from_url(url: &Url) -> Result<Self, ForwardError> {
        let invalid = || ForwardError::InvalidTarget(url.to_string());

        let scheme = Scheme::from_str(url.scheme()).map_err(|_| invalid())?;
        let host = url.host_str().ok_or_else(invalid)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|_| invalid())?;

        Ok(Self {
            scheme,
            authority,
            base_path: url.path().to_string(),
        })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

/// `Forward` implementation backed by a hyper-util legacy client.
pub struct HttpForwarder {
    target: UpstreamTarget,
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
}

impl HttpForwarder {
    pub fn new(url: &Url, timeouts: &TimeoutConfig) -> Result<Self, ForwardError> {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect()));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            target: UpstreamTarget::from_url(url)?,
            client,
            request_timeout: timeouts.request(),
        })
    }
}

impl Forward for HttpForwarder {
    fn forward<'a>(
        &'a self,
        request: &'a BufferedRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>> {
        Box::pin(async move {
            let upstream = request.to_upstream(&self.target)?;
            let response: Response<Incoming> =
                tokio::time::timeout(self.request_timeout, self.client.request(upstream))
                    .await
                    .map_err(|_| ForwardError::Timeout(self.request_timeout))??;
            Ok(from_upstream(response))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_url() {
        let target = UpstreamTarget::from_url(&Url::parse("http://backend.local:8080").unwrap()).unwrap();
        assert_eq!(target.scheme(), &Scheme::HTTP);
        assert_eq!(target.authority().as_str(), "backend.local:8080");
        assert_eq!(target.base_path(), "/");
    }

    #[test]
    fn test_target_default_port_is_implicit() {
        let target = UpstreamTarget::from_url(&Url::parse("http://backend.local").unwrap()).unwrap();
        assert_eq!(target.authority().as_str(), "backend.local");
        assert_eq!(target.authority().port_u16(), None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind and drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}", addr)).unwrap();
        let forwarder = HttpForwarder::new(&url, &TimeoutConfig::default()).unwrap();

        let (parts, _) = axum::http::Request::builder().uri("/").body(()).unwrap().into_parts();
        let request = BufferedRequest::new(parts, Default::default(), None);

        let err = forwarder.forward(&request).await.unwrap_err();
        assert!(matches!(err, ForwardError::Transport(_)), "got {:?}", err);
    }
}
