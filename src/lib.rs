#![forbid(unsafe_code)]
//! logq: a columnar log-query pipeline sort stage.
//!
//! Facade over the workspace crates: parse a `sort` clause with
//! [`parse_sort_clause`], wrap it in a [`SortPipe`], and feed blocks from
//! parallel workers through the resulting [`PipeProcessor`].

pub use logq_core::block::{Block, Column, ColumnBuilder, ColumnKind};
pub use logq_core::budget::{ChunkSteal, StateBudget, STATE_SIZE_BUDGET_CHUNK};
pub use logq_core::cancel::CancelToken;
pub use logq_core::coerce;
pub use logq_core::config::PipelineConfig;
pub use logq_core::fields::FieldSet;
pub use logq_core::sort_expr::{quote_field_name, SortConfig, SortKey};
pub use logq_lang::{parse_sort_clause, ParseError};
pub use logq_mem::{AtomicStateBudget, PeakTracker};
pub use logq_operators::{PipeError, PipeProcessor, SortPipe, SortPipeProcessor};
