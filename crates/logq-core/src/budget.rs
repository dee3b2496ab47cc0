//! Abstract state-size budget interface.
//!
//! The concrete implementation lives in `logq-mem`. We keep only the trait
//! here so any crate can depend on the API without pulling in the atomics.

/// Quantum by which shards draw from the shared budget. Bounds the contention
/// rate on the global counter.
pub const STATE_SIZE_BUDGET_CHUNK: usize = 64 * 1024;

/// Outcome of drawing one chunk from the shared budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSteal {
    /// One chunk was granted; credit it to the local account.
    Granted,
    /// The budget is drained; stop ingesting. `first_over` is true only for
    /// the caller whose subtraction drove the counter from non-negative to
    /// negative; that caller is responsible for quiescing its peers.
    Exhausted { first_over: bool },
}

/// A shared memory account that worker shards draw chunks from.
///
/// Implemented by `logq-mem`. The counter is the only cross-thread shared
/// mutable state during ingest, so implementations must use atomic
/// read-modify-write operations.
pub trait StateBudget: Send + Sync + 'static {
    /// Atomically subtract one chunk from the shared counter.
    fn steal_chunk(&self) -> ChunkSteal;

    /// Remaining bytes; negative once drained.
    fn remaining_bytes(&self) -> i64;

    /// Configured ceiling (bytes, after per-shard pre-charges).
    fn max_bytes(&self) -> i64;
}

// NOTE: Do *not* add default impls here that would silently grant chunks.
// The mem crate is the only place where budget accounting should live.
