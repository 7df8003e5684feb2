//! Retry and reroute policy.
//!
//! # Responsibilities
//! - Carry the per-request retry/attempt counters
//! - Decide, after a transport failure, between retrying the same backend and rerouting
//! - Decide whether a request may still be routed at all
//!
//! # Design Decisions
//! - Fixed short delay between same-backend retries, no jitter
//! - Counters only grow for the lifetime of one request
//! - Only transport failures reach this policy; HTTP statuses never do

use std::time::Duration;

use crate::config::RetryConfig;

/// Counters carried alongside one inbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounters {
    /// Times the router was re-entered after a backend was marked dead.
    pub attempts: u32,
    /// Same-backend retries performed, summed over every backend tried.
    pub retries: u32,
}

/// What to do after a forwarding try failed at the transport level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Wait, then send the identical request to the same backend.
    RetrySame(Duration),
    /// Mark the backend dead and go back through the router.
    Reroute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            max_attempts: config.max_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Whether the router may still pick a backend for this request.
    pub fn admits(&self, counters: &RequestCounters) -> bool {
        counters.attempts <= self.max_attempts
    }

    /// Next step after a failed try, given the retries already spent on this backend.
    pub fn on_forward_error(&self, retries_on_peer: u32) -> Step {
        if retries_on_peer < self.max_retries {
            Step::RetrySame(self.retry_delay)
        } else {
            Step::Reroute
        }
    }

    /// Upper bound on forwarding tries for one request.
    pub fn max_forward_tries(&self) -> u32 {
        (self.max_attempts + 1) * (self.max_retries + 1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
