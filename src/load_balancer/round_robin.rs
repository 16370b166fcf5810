//! Round-robin load balancing strategy.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::load_balancer::LoadBalancer;

/// Round-robin selector.
///
/// The cursor is incremented before the modulo, so a fresh selector hands out
/// index 1 first: with two backends the sequence is 1, 0, 1, 0, ...
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor value (number of selections made so far, modulo 2^64).
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Relaxed)
    }
}

impl LoadBalancer for RoundRobin {
    fn next_index(&self, len: NonZeroUsize) -> usize {
        let next = self.cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        (next % len.get() as u64) as usize
    }
}
