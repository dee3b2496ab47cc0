//! Shared state-size budget backed by a single atomic counter.
//!
//! Worker shards keep a local byte account and refill it here one chunk at a
//! time; the global counter is the only cross-thread shared mutable state on
//! the ingest path.

use std::sync::atomic::{AtomicI64, Ordering};

use logq_core::budget::{ChunkSteal, StateBudget, STATE_SIZE_BUDGET_CHUNK};

/// Concrete `StateBudget` used by stateful pipe processors.
///
/// The counter may go negative; the first caller to observe the transition
/// gets `first_over` and is expected to raise cancellation for its peers.
#[derive(Debug)]
pub struct AtomicStateBudget {
    remaining: AtomicI64,
    max_bytes: i64,
}

impl AtomicStateBudget {
    /// Seed the budget with `max_state_size` bytes (already net of any
    /// per-shard pre-charges).
    pub fn new(max_state_size: i64) -> Self {
        Self {
            remaining: AtomicI64::new(max_state_size),
            max_bytes: max_state_size,
        }
    }
}

impl StateBudget for AtomicStateBudget {
    fn steal_chunk(&self) -> ChunkSteal {
        let chunk = STATE_SIZE_BUDGET_CHUNK as i64;
        let after = self.remaining.fetch_sub(chunk, Ordering::AcqRel) - chunk;
        if after < 0 {
            #[cfg(feature = "tracing")]
            tracing::trace!(after, "state budget drained");
            ChunkSteal::Exhausted {
                first_over: after + chunk >= 0,
            }
        } else {
            ChunkSteal::Granted
        }
    }

    fn remaining_bytes(&self) -> i64 {
        self.remaining.load(Ordering::Acquire)
    }

    fn max_bytes(&self) -> i64 {
        self.max_bytes
    }
}
