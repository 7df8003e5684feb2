//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request router asks for a peer
//!     → pool.rs (fixed backend list)
//!     → round_robin.rs (advance cursor, skip dead backends)
//!     → backend.rs (liveness check, owned transport)
//!     → Return a live backend or None
//! ```
//!
//! # Design Decisions
//! - Backend set is fixed at startup; only liveness mutates
//! - Cursor is a single atomic; selection never blocks on other selections
//! - Liveness is a per-backend reader/writer lock; no global snapshot

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::{PoolError, ServerPool};
