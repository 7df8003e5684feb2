//! TCP liveness probe.
//!
//! A backend is alive if a TCP connection to its host:port can be opened
//! within the timeout. The connection is closed immediately.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;
use url::{Host, Url};

/// Host and port the probe dials for `url`. The port falls back to the scheme default.
pub fn probe_target(url: &Url) -> Option<(String, u16)> {
    let host = match url.host()? {
        Host::Domain(domain) => domain.to_string(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };
    let port = url.port_or_known_default()?;
    Some((host, port))
}

/// Open and close a TCP connection to the backend.
pub async fn is_backend_alive(url: &Url, timeout: Duration) -> bool {
    let Some((host, port)) = probe_target(url) else {
        tracing::warn!(backend = %url, "Site unreachable: no host/port to probe");
        return false;
    };

    match time::timeout(timeout, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = %url, error = %e, "Site unreachable");
            false
        }
        Err(_) => {
            tracing::warn!(backend = %url, timeout = ?timeout, "Site unreachable: timeout");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_target() {
        let url = Url::parse("http://example.com").unwrap();
        assert_eq!(probe_target(&url), Some(("example.com".to_string(), 80)));

        let url = Url::parse("http://127.0.0.1:3031/api").unwrap();
        assert_eq!(probe_target(&url), Some(("127.0.0.1".to_string(), 3031)));

        let url = Url::parse("http://[::1]:8080").unwrap();
        assert_eq!(probe_target(&url), Some(("::1".to_string(), 8080)));
    }

    #[tokio::test]
    async fn test_listening_port_is_alive() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        assert!(is_backend_alive(&url, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_closed_port_is_dead() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}", addr)).unwrap();
        assert!(!is_backend_alive(&url, Duration::from_secs(2)).await);
    }
}
