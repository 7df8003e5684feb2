//! Round-robin rotation with dead-peer skipping.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::load_balancer::backend::Backend;

/// Round-robin selector.
/// Stores the shared rotation cursor; lock-free.
#[derive(Debug, Default)]
pub struct RoundRobin {
    current: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the cursor at an arbitrary position.
    pub fn starting_at(cursor: u64) -> Self {
        Self {
            current: AtomicU64::new(cursor),
        }
    }

    /// Current raw cursor value.
    pub fn cursor(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Advance the cursor and map the new value onto `len` slots.
    ///
    /// Every call advances, whatever the caller does with the index, so
    /// concurrent callers fan out across the ring.
    pub fn next_index(&self, len: usize) -> usize {
        let advanced = self.current.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        advanced.checked_rem(len as u64).unwrap_or(0) as usize
    }

    /// Pick the first alive backend at or after the next index.
    ///
    /// Scans at most `backends.len()` slots. When dead backends were skipped
    /// the cursor is moved to the chosen slot, so the following call starts
    /// past a known-live position.
    pub fn next_alive<'a>(&self, backends: &'a [Backend]) -> Option<&'a Backend> {
        let len = backends.len();
        if len == 0 {
            return None;
        }

        let next = self.next_index(len);
        for i in next..next + len {
            let index = i % len;
            let backend = &backends[index];
            if backend.is_alive() {
                if i != next {
                    self.current.store(index as u64, Ordering::SeqCst);
                }
                return Some(backend);
            }
        }
        None
    }
}
