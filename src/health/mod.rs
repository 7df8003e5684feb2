//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → ServerPool::health_check sweep
//!     → probe.rs (TCP connect + close per backend)
//!     → Backend::set_alive
//!
//! Failure observation (resilience::failover):
//!     Retries on one backend exhausted
//!     → ServerPool::mark_backend_status(url, false)
//! ```
//!
//! # Design Decisions
//! - The sweep is the only path that brings a dead backend back
//! - A slow probe blocks only the monitor task, bounded by its timeout
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod probe;

pub use active::HealthMonitor;
