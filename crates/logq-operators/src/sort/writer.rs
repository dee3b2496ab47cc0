//! Output batching: ordered rows accumulate into result columns and flush
//! downstream on shape change or size.

use logq_core::block::{Block, Column, ColumnBuilder};
use logq_core::sort_expr::SortConfig;

use crate::traits::PipeProcessor;

use super::shard::Shard;

/// Flush once the accumulated cell bytes reach this threshold.
const MAX_BATCH_VALUES_LEN: usize = 1_000_000;

/// Accumulates output rows across `write_row` calls and resets after each
/// flush, keeping column names for subsequent appends.
pub(crate) struct SortWriteContext<'a> {
    cfg: &'a SortConfig,
    downstream: &'a dyn PipeProcessor,
    builders: Vec<ColumnBuilder>,
    values_len: usize,
}

impl<'a> SortWriteContext<'a> {
    pub fn new(cfg: &'a SortConfig, downstream: &'a dyn PipeProcessor) -> Self {
        Self {
            cfg,
            downstream,
            builders: Vec::new(),
            values_len: 0,
        }
    }

    /// Append the row at `shard.row_refs[row_ref_idx]` to the accumulator.
    pub fn write_row(&mut self, shard: &Shard, row_ref_idx: usize) {
        let rr = shard.row_refs[row_ref_idx];
        let sb = &shard.blocks[rr.block_idx as usize];
        let row = rr.row_idx as usize;
        let by_len = self.cfg.by_fields.len();

        let mut same_columns = self.builders.len() == by_len + sb.other_columns.len();
        if same_columns {
            for (i, &ci) in sb.other_columns.iter().enumerate() {
                if self.builders[by_len + i].name != sb.block.columns()[ci].name {
                    same_columns = false;
                    break;
                }
            }
        }
        if !same_columns {
            // Ship what we have and start a block with the new column shape.
            self.flush();
            self.builders.clear();
            for key in &self.cfg.by_fields {
                self.builders.push(ColumnBuilder::new(key.name.clone()));
            }
            for &ci in &sb.other_columns {
                self.builders
                    .push(ColumnBuilder::new(sb.block.columns()[ci].name.clone()));
            }
        }

        for i in 0..by_len {
            let v = sb.by_value_at(i, row);
            self.builders[i].push(v);
            self.values_len += v.len();
        }
        for (i, &ci) in sb.other_columns.iter().enumerate() {
            let v = sb.block.value_at(ci, row);
            self.builders[by_len + i].push(v);
            self.values_len += v.len();
        }

        if self.values_len >= MAX_BATCH_VALUES_LEN {
            self.flush();
        }
    }

    /// Reconstruct an output block from the accumulator and hand it to the
    /// downstream processor as worker 0.
    pub fn flush(&mut self) {
        self.values_len = 0;

        if self.builders.is_empty() || self.builders[0].row_count() == 0 {
            return;
        }

        let columns: Vec<Column> = self.builders.iter_mut().map(|b| b.take_column()).collect();
        let block = Block::from_result_columns(columns)
            .expect("builders accumulate one cell per column per row");
        #[cfg(feature = "tracing")]
        tracing::trace!(rows = block.row_count(), "sort output batch");
        self.downstream.write_block(0, &block);
    }
}
