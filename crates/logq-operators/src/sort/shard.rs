//! Per-worker sort shard: owned blocks, typed side-arrays, row references.

use logq_core::block::{Block, Column, ColumnKind};
use logq_core::coerce::{parse_f64_cells, parse_i64_cells};
use logq_core::sort_expr::SortConfig;
use logq_mem::acquire_scratch;

use super::cmp::cmp_rows;

/// Reference to a single row: `(block, row)` indices, 8 bytes per row.
///
/// Sorting permutes a vector of these; block storage never moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowRef {
    pub block_idx: u32,
    pub row_idx: u32,
}

/// Where a sort-key column lives.
pub(crate) enum ByColumnSource {
    /// Index into the owned block's columns.
    Block(usize),
    /// Column synthesized at ingest: the all-columns concatenation, or an
    /// empty const stand-in for a key name the block does not carry.
    Owned(Column),
}

/// One sort-key column of a block, with its pre-parsed numeric side-arrays.
///
/// Time columns carry no side-arrays (the comparator reads raw timestamps);
/// const columns carry one-element arrays applying to every row.
pub(crate) struct ByColumn {
    pub source: ByColumnSource,
    pub i64_values: Vec<i64>,
    pub f64_values: Vec<f64>,
}

impl ByColumn {
    pub fn column<'a>(&'a self, block: &'a Block) -> &'a Column {
        match &self.source {
            ByColumnSource::Block(idx) => &block.columns()[*idx],
            ByColumnSource::Owned(c) => c,
        }
    }

    pub fn i64_at(&self, block: &Block, row: usize) -> i64 {
        if self.column(block).is_const() {
            self.i64_values[0]
        } else {
            self.i64_values[row]
        }
    }

    pub fn f64_at(&self, block: &Block, row: usize) -> f64 {
        if self.column(block).is_const() {
            self.f64_values[0]
        } else {
            self.f64_values[row]
        }
    }
}

/// A block prepared for sorting.
pub(crate) struct SortBlock {
    pub block: Block,
    pub by_columns: Vec<ByColumn>,
    /// Indices of the block columns that are not sort keys.
    pub other_columns: Vec<usize>,
}

impl SortBlock {
    pub fn by_value_at(&self, key_idx: usize, row: usize) -> &str {
        let c = self.by_columns[key_idx].column(&self.block);
        match c.kind {
            ColumnKind::Const => &c.values()[0],
            _ => &c.values()[row],
        }
    }
}

/// Per-worker ingest/sort partition.
///
/// Ingest order is preserved in `blocks` and `row_refs`; the local sort
/// permutes `row_refs` only, and `row_ref_next` advances during the merge
/// phase.
#[derive(Default)]
pub(crate) struct Shard {
    pub blocks: Vec<SortBlock>,
    pub row_refs: Vec<RowRef>,
    pub row_ref_next: usize,

    /// Remaining byte budget for the whole shard state. Replenished in
    /// chunks from the shared budget by the parent processor.
    pub state_size_budget: i64,
}

impl Shard {
    pub fn remaining_rows(&self) -> usize {
        self.row_refs.len() - self.row_ref_next
    }

    /// The row used as this shard's heap key during the merge phase.
    pub fn head(&self) -> RowRef {
        self.row_refs[self.row_ref_next]
    }

    /// Clone `src` into the shard and prepare it for sorting.
    pub fn write_block(&mut self, cfg: &SortConfig, src: &Block) {
        let block = src.clone();
        let rows = block.row_count();
        let mut state_size = block.size_bytes();

        let sort_block = if cfg.by_all_columns() {
            // Sort by all the columns: JSON-encode every column per row into
            // a single synthesized string key.
            let mut buf = acquire_scratch();
            let mut cells = Vec::with_capacity(rows);
            for row in 0..rows {
                buf.clear();
                for ci in 0..block.columns().len() {
                    push_json_quoted(&mut buf, &block.columns()[ci].name);
                    buf.push(b':');
                    push_json_quoted(&mut buf, block.value_at(ci, row));
                    buf.push(b',');
                }
                cells.push(String::from_utf8_lossy(&buf).into_owned());
            }
            state_size += cells
                .iter()
                .map(|c| c.len() + std::mem::size_of::<String>())
                .sum::<usize>();

            let i64_values = vec![0i64; rows];
            let f64_values = vec![f64::NAN; rows];
            state_size += rows * (std::mem::size_of::<i64>() + std::mem::size_of::<f64>());

            let other_columns = (0..block.columns().len()).collect();
            SortBlock {
                by_columns: vec![ByColumn {
                    source: ByColumnSource::Owned(Column::plain("", cells)),
                    i64_values,
                    f64_values,
                }],
                other_columns,
                block,
            }
        } else {
            let mut by_columns = Vec::with_capacity(cfg.by_fields.len());
            for key in &cfg.by_fields {
                let source = match block.column_index(&key.name) {
                    Some(idx) => ByColumnSource::Block(idx),
                    // A key the block does not carry sorts as an empty const
                    // cell and emits empty output values.
                    None => {
                        ByColumnSource::Owned(Column::const_value(key.name.clone(), String::new()))
                    }
                };
                let column = match &source {
                    ByColumnSource::Block(idx) => &block.columns()[*idx],
                    ByColumnSource::Owned(c) => c,
                };
                let (i64_values, f64_values) = if column.is_time() {
                    // The comparator reads raw timestamps for time keys;
                    // skipping the side-arrays saves memory.
                    (Vec::new(), Vec::new())
                } else {
                    let cells = column.values();
                    (parse_i64_cells(cells), parse_f64_cells(cells))
                };
                state_size += i64_values.len() * std::mem::size_of::<i64>()
                    + f64_values.len() * std::mem::size_of::<f64>();
                by_columns.push(ByColumn {
                    source,
                    i64_values,
                    f64_values,
                });
            }

            let other_columns: Vec<usize> = block
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, c)| !cfg.by_fields.iter().any(|k| k.name == c.name))
                .map(|(idx, _)| idx)
                .collect();
            state_size += other_columns.len() * std::mem::size_of::<usize>();

            SortBlock {
                block,
                by_columns,
                other_columns,
            }
        };

        state_size += std::mem::size_of::<SortBlock>();

        let block_idx = self.blocks.len() as u32;
        self.blocks.push(sort_block);
        for row in 0..rows {
            self.row_refs.push(RowRef {
                block_idx,
                row_idx: row as u32,
            });
        }
        state_size += rows * std::mem::size_of::<RowRef>();

        self.state_size_budget -= state_size as i64;
    }

    /// Sort the shard's row references in place. pdqsort: O(n log n) worst
    /// case, and the total preorder makes stability irrelevant.
    pub fn sort_local(&mut self, cfg: &SortConfig) {
        let blocks = &self.blocks;
        self.row_refs
            .sort_unstable_by(|&a, &b| cmp_rows(cfg, blocks, a, blocks, b));
    }
}

fn push_json_quoted(dst: &mut Vec<u8>, s: &str) {
    serde_json::to_writer(&mut *dst, s).expect("encoding a string into a Vec cannot fail");
}
