//! Shared helpers for integration tests: deterministic pseudo-random data
//! and a collecting downstream stage.
#![allow(dead_code)]

use std::sync::Mutex;

use logq_core::block::{Block, Column};
use logq_operators::{PipeProcessor, SortPipe, SortPipeProcessor};
use logq_core::cancel::CancelToken;
use logq_core::sort_expr::SortConfig;
use std::sync::Arc;

/// Small deterministic generator so failures reproduce exactly.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 11
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// Build an ingest block of plain columns from row-major string data.
pub fn block_from_rows(names: &[&str], rows: &[Vec<&str>]) -> Block {
    let columns = names
        .iter()
        .enumerate()
        .map(|(ci, name)| {
            let cells = rows.iter().map(|r| r[ci].to_string()).collect();
            Column::plain(name.to_string(), cells)
        })
        .collect();
    Block::new(vec![0; rows.len()], columns).expect("test block is well-formed")
}

/// Flatten a block into per-row `(column, value)` pairs.
pub fn block_rows(block: &Block) -> Vec<Vec<(String, String)>> {
    (0..block.row_count())
        .map(|row| {
            block
                .columns()
                .iter()
                .enumerate()
                .map(|(ci, c)| (c.name.clone(), block.value_at(ci, row).to_string()))
                .collect()
        })
        .collect()
}

/// Downstream stage that keeps every output block.
#[derive(Default)]
pub struct Collector {
    pub blocks: Mutex<Vec<Block>>,
}

impl Collector {
    pub fn rows(&self) -> Vec<Vec<(String, String)>> {
        self.blocks
            .lock()
            .unwrap()
            .iter()
            .flat_map(block_rows)
            .collect()
    }
}

impl PipeProcessor for Collector {
    fn write_block(&self, _worker_id: usize, block: &Block) {
        self.blocks.lock().unwrap().push(block.clone());
    }

    fn flush(&self) -> logq_operators::traits::Result<()> {
        Ok(())
    }
}

/// Run `blocks_per_worker` through a fresh sort processor and return the
/// flush result plus the collected output rows.
pub fn run_sort(
    config: SortConfig,
    workers: usize,
    allowed_memory_bytes: usize,
    blocks_per_worker: Vec<Vec<Block>>,
) -> (logq_operators::traits::Result<()>, Vec<Vec<(String, String)>>) {
    let collector = Arc::new(Collector::default());
    let processor: SortPipeProcessor = SortPipe::new(config).into_processor(
        workers,
        allowed_memory_bytes,
        CancelToken::new(),
        Arc::clone(&collector) as Arc<dyn PipeProcessor>,
    );
    for (worker, blocks) in blocks_per_worker.into_iter().enumerate() {
        for block in blocks {
            processor.write_block(worker, &block);
        }
    }
    let result = processor.flush();
    (result, collector.rows())
}
