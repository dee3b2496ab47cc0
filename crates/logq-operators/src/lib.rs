#![forbid(unsafe_code)]
//! logq-operators: pipeline pipes over columnar blocks.
//!
//! Design intent:
//! - Pipes are synchronous; parallelism comes from the workers that feed
//!   them, one shard per worker.
//! - All state growth is accounted against the shared budget from
//!   `logq-mem`, so a pipe stops ingesting before the process OOMs.

pub mod sort;
pub mod traits;

pub use sort::{SortPipe, SortPipeProcessor};
pub use traits::{PipeError, PipeProcessor};
