//! Column-oriented result blocks flowing between pipeline stages.
//!
//! A block is a batch of rows: a timestamp vector plus named string columns.
//! Cells are always UTF-8 strings; numeric interpretation happens lazily in
//! the operators that need it (see `coerce`).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage class of a column inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// One value per row.
    Plain,
    /// A single value shared by every row of the block.
    Const,
    /// The block timestamp vector rendered as strings; comparisons use the
    /// raw `i64` timestamps instead of the rendered cells.
    Time,
}

/// A named column of string cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    values: Vec<String>,
}

impl Column {
    /// One value per row.
    pub fn plain(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Plain,
            values,
        }
    }

    /// A constant column: one stored value applying to every row.
    pub fn const_value(name: impl Into<String>, value: String) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Const,
            values: vec![value],
        }
    }

    /// A timestamp column. Cells are materialized from the block's timestamp
    /// vector when the block is constructed.
    pub fn time(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Time,
            values: Vec::new(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_const(&self) -> bool {
        self.kind == ColumnKind::Const
    }

    pub fn is_time(&self) -> bool {
        self.kind == ColumnKind::Time
    }
}

/// A columnar batch of rows.
///
/// Immutable after construction; operators that need ownership clone the
/// whole block. `row_count` is tracked explicitly because result blocks
/// produced downstream of the first stage carry no timestamp vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    timestamps: Vec<i64>,
    columns: Vec<Column>,
    rows: usize,
}

impl Block {
    /// Build an ingest block from a timestamp vector and columns.
    ///
    /// Every `Plain` column must have exactly one cell per timestamp; `Const`
    /// columns carry exactly one cell; `Time` columns are filled from the
    /// timestamps when empty.
    pub fn new(timestamps: Vec<i64>, mut columns: Vec<Column>) -> Result<Self> {
        let rows = timestamps.len();
        for c in &mut columns {
            match c.kind {
                ColumnKind::Plain => {
                    if c.values.len() != rows {
                        return Err(Error::Block(format!(
                            "column '{}' has {} cells for {} rows",
                            c.name,
                            c.values.len(),
                            rows
                        )));
                    }
                }
                ColumnKind::Const => {
                    if c.values.len() != 1 {
                        return Err(Error::Block(format!(
                            "const column '{}' must hold exactly one cell",
                            c.name
                        )));
                    }
                }
                ColumnKind::Time => {
                    if c.values.is_empty() {
                        c.values = timestamps.iter().map(|t| t.to_string()).collect();
                    } else if c.values.len() != rows {
                        return Err(Error::Block(format!(
                            "time column '{}' has {} cells for {} rows",
                            c.name,
                            c.values.len(),
                            rows
                        )));
                    }
                }
            }
        }
        Ok(Self {
            timestamps,
            columns,
            rows,
        })
    }

    /// Build a result block out of plain columns, with no timestamp vector.
    pub fn from_result_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for c in &columns {
            if c.kind != ColumnKind::Plain {
                return Err(Error::Block(format!(
                    "result column '{}' must be plain",
                    c.name
                )));
            }
            if c.values.len() != rows {
                return Err(Error::Block(format!(
                    "result column '{}' has {} cells for {} rows",
                    c.name,
                    c.values.len(),
                    rows
                )));
            }
        }
        Ok(Self {
            timestamps: Vec::new(),
            columns,
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell value at `(column, row)`. Const columns yield their single cell
    /// for every row.
    pub fn value_at(&self, col_idx: usize, row: usize) -> &str {
        let c = &self.columns[col_idx];
        match c.kind {
            ColumnKind::Const => &c.values[0],
            _ => &c.values[row],
        }
    }

    /// Sizeof-style estimate of owned bytes, used for budget accounting.
    /// Deliberately approximate; what matters is that identical workloads
    /// hit identical thresholds.
    pub fn size_bytes(&self) -> usize {
        let mut n = self.timestamps.len() * std::mem::size_of::<i64>();
        for c in &self.columns {
            n += c.name.len() + std::mem::size_of::<Column>();
            n += c
                .values
                .iter()
                .map(|v| v.len() + std::mem::size_of::<String>())
                .sum::<usize>();
        }
        n
    }
}

/// Accumulator for one output column; cleared between flushes but keeps its
/// name so subsequent rows land in the same slot.
#[derive(Debug, Default)]
pub struct ColumnBuilder {
    pub name: String,
    values: Vec<String>,
}

impl ColumnBuilder {
    pub fn new(name: String) -> Self {
        Self {
            name,
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, value: &str) {
        self.values.push(value.to_string());
    }

    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    /// Drain the accumulated cells into a plain column, keeping the name.
    pub fn take_column(&mut self) -> Column {
        Column::plain(self.name.clone(), std::mem::take(&mut self.values))
    }
}
