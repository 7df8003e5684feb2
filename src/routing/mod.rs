//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Buffered request + counters
//!     → router.rs (attempt ceiling check)
//!     → ServerPool::get_next_peer
//!     → Return: live Backend or Rejection
//! ```
//!
//! # Design Decisions
//! - No path or host matching: every request goes to the one pool
//! - Rejections map to 503 "Service not available"

pub mod router;

pub use router::{Rejection, Router};
