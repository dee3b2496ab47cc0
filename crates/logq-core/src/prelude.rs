//! Convenient re-exports for downstream crates.

pub use crate::block::{Block, Column, ColumnBuilder, ColumnKind};
pub use crate::budget::{ChunkSteal, StateBudget, STATE_SIZE_BUDGET_CHUNK};
pub use crate::cancel::CancelToken;
pub use crate::config::PipelineConfig;
pub use crate::error::{Error, Result};
pub use crate::fields::FieldSet;
pub use crate::sort_expr::{SortConfig, SortKey};
