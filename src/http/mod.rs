//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body buffering)
//!     → request.rs (BufferedRequest)
//!     → [routing + failover pick a backend]
//!     → forward.rs (hyper client to the upstream)
//!     → response.rs (strip hop-by-hop headers, or build 503/413)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forward, ForwardError, HttpForwarder};
pub use request::{BufferedRequest, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
