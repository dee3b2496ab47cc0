//! Pipe processor trait + common interfaces.
//!
//! A query pipeline is a chain of processors; each stage receives blocks from
//! parallel upstream workers and writes blocks to the next stage.

use logq_core::block::Block;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipeError>;

#[derive(Debug, Error)]
pub enum PipeError {
    /// The operator's state ceiling was exceeded during ingest. Retryable
    /// with a larger memory allowance.
    #[error("cannot calculate [{clause}], since it requires more than {max_mb}MB of memory")]
    MemoryLimitExceeded { clause: String, max_mb: i64 },
}

/// Trait that all pipe processors implement.
///
/// Invariants:
/// - `write_block(worker_id, ...)` is called exclusively by worker
///   `worker_id`; implementations may keep per-worker state without locking
///   against other workers.
/// - `flush` is called exactly once, after every worker has finished writing.
/// - Ingest-path failures must not be raised synchronously (they would race
///   with the other workers); they are recorded and surfaced by `flush`.
pub trait PipeProcessor: Send + Sync {
    /// Ingest one block on behalf of `worker_id`. Empty blocks are dropped.
    fn write_block(&self, worker_id: usize, block: &Block);

    /// Finalize the stage and push remaining output downstream.
    fn flush(&self) -> Result<()>;
}
