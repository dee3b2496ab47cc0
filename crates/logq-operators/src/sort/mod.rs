//! The `sort` pipe: globally ordered row output over column-oriented blocks.
//!
//! Ingest is sharded one shard per worker and sorts references, not row
//! payloads. After a parallel local sort, a k-way merge streams rows to the
//! downstream processor in batches, all under a hard state-size budget with
//! early cancellation.

mod cmp;
mod merge;
mod shard;
mod writer;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use crossbeam_utils::CachePadded;

use logq_core::block::Block;
use logq_core::budget::{ChunkSteal, StateBudget, STATE_SIZE_BUDGET_CHUNK};
use logq_core::cancel::CancelToken;
use logq_core::sort_expr::SortConfig;
use logq_mem::{AtomicStateBudget, PeakTracker};

use crate::traits::{PipeError, PipeProcessor, Result};

use merge::{merge_shards, MergeOutcome};
use shard::Shard;
use writer::SortWriteContext;

/// Fraction of the pipeline memory allowance granted to sort state.
const STATE_SIZE_FRACTION: f64 = 0.2;

const STAGE_INGESTING: u8 = 0;
const STAGE_FLUSHING: u8 = 1;
const STAGE_DONE: u8 = 2;

/// The `sort` pipe. Construct from a parsed [`SortConfig`], then turn into a
/// processor wired to a worker count and a downstream stage.
pub struct SortPipe {
    config: SortConfig,
}

impl SortPipe {
    pub fn new(config: SortConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Build the processor for one query execution.
    ///
    /// `allowed_memory_bytes` is queried once here; the sort state ceiling is
    /// a fixed fraction of it, minus one pre-charged budget chunk per shard.
    pub fn into_processor(
        self,
        workers: usize,
        allowed_memory_bytes: usize,
        cancel: CancelToken,
        downstream: Arc<dyn PipeProcessor>,
    ) -> SortPipeProcessor {
        let mut max_state_size = (allowed_memory_bytes as f64 * STATE_SIZE_FRACTION) as i64;
        let mut shards = Vec::with_capacity(workers);
        for _ in 0..workers {
            let shard = Shard {
                state_size_budget: STATE_SIZE_BUDGET_CHUNK as i64,
                ..Shard::default()
            };
            max_state_size -= STATE_SIZE_BUDGET_CHUNK as i64;
            shards.push(CachePadded::new(Mutex::new(shard)));
        }

        SortPipeProcessor {
            config: self.config,
            cancel,
            downstream,
            shards,
            budget: AtomicStateBudget::new(max_state_size),
            peak: PeakTracker::new(),
            stage: AtomicU8::new(STAGE_INGESTING),
        }
    }
}

/// Processor for one execution of the sort pipe.
///
/// Lifecycle: ingesting → flushing → done, with cancellation cutting across
/// every stage. Late `write_block` calls are ignored; a cancelled `flush`
/// returns success with whatever output was already emitted.
pub struct SortPipeProcessor {
    config: SortConfig,
    cancel: CancelToken,
    downstream: Arc<dyn PipeProcessor>,

    /// One shard per worker. Each mutex is only ever contended at flush time;
    /// during ingest, worker `i` is the sole caller touching shard `i`. The
    /// padding prevents false sharing between neighboring shards.
    shards: Vec<CachePadded<Mutex<Shard>>>,

    budget: AtomicStateBudget,
    peak: PeakTracker,
    stage: AtomicU8,
}

impl SortPipeProcessor {
    /// Highest observed state size in bytes; advisory.
    pub fn peak_state_bytes(&self) -> usize {
        self.peak.peak()
    }

    fn run_flush(&self) -> Result<()> {
        if self.budget.remaining_bytes() <= 0 {
            return Err(PipeError::MemoryLimitExceeded {
                clause: self.config.to_string(),
                max_mb: self.budget.max_bytes() / (1 << 20),
            });
        }
        if self.cancel.is_cancelled() {
            return Ok(());
        }

        // Sort every shard in parallel.
        // TODO: poll cancellation inside the local sorts; a shard with many
        // rows keeps sorting after a peer cancels.
        thread::scope(|scope| {
            for slot in &self.shards {
                scope.spawn(move || slot.lock().unwrap().sort_local(&self.config));
            }
        });

        if self.cancel.is_cancelled() {
            return Ok(());
        }

        // Merge sorted runs across shards, single-threaded.
        let mut guards: Vec<MutexGuard<'_, Shard>> =
            self.shards.iter().map(|s| s.lock().unwrap()).collect();
        let mut shards: Vec<&mut Shard> = guards.iter_mut().map(|g| &mut **g).collect();

        let mut wctx = SortWriteContext::new(&self.config, self.downstream.as_ref());
        if merge_shards(&self.config, &mut shards, &self.cancel, &mut wctx)
            == MergeOutcome::Completed
        {
            wctx.flush();
        }
        Ok(())
    }
}

impl PipeProcessor for SortPipeProcessor {
    fn write_block(&self, worker_id: usize, block: &Block) {
        if block.row_count() == 0 {
            return;
        }
        if self.stage.load(Ordering::Acquire) != STAGE_INGESTING || self.cancel.is_cancelled() {
            return;
        }

        let mut shard = self.shards[worker_id].lock().unwrap();

        while shard.state_size_budget < 0 {
            // Refill the local account from the shared budget, one chunk at
            // a time.
            match self.budget.steal_chunk() {
                ChunkSteal::Granted => {
                    shard.state_size_budget += STATE_SIZE_BUDGET_CHUNK as i64;
                }
                ChunkSteal::Exhausted { first_over } => {
                    if first_over {
                        // Quiesce peer workers; the diagnostic surfaces at
                        // flush, where the drained budget is still visible.
                        #[cfg(feature = "tracing")]
                        tracing::debug!(clause = %self.config, "state budget exhausted");
                        self.cancel.cancel();
                    }
                    return;
                }
            }
        }

        shard.write_block(&self.config, block);

        let used = (self.budget.max_bytes() - self.budget.remaining_bytes()).max(0) as usize;
        self.peak.record_used(used);
    }

    fn flush(&self) -> Result<()> {
        // Flushing is entered exactly once; later calls are no-ops.
        if self
            .stage
            .compare_exchange(
                STAGE_INGESTING,
                STAGE_FLUSHING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Ok(());
        }
        let result = self.run_flush();
        self.stage.store(STAGE_DONE, Ordering::Release);
        result
    }
}
