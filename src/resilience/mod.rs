//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward to backend fails (transport level):
//!     → retries.rs (retry same backend after a fixed delay?)
//!     → failover.rs (or mark backend dead and reroute)
//!     → routing::Router (pick another peer, or reject)
//! ```
//!
//! # Design Decisions
//! - Per-request counters are explicit values, not request extensions
//! - Both ceilings are fixed per process; no retry budget across requests
//! - Upstream HTTP error statuses are not failures here

pub mod failover;
pub mod retries;

pub use retries::{RequestCounters, RetryPolicy, Step};
