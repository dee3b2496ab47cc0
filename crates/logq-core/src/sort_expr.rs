//! Sort-clause configuration and its canonical printed form.
//!
//! The printed form is user-visible: it appears verbatim inside the
//! over-memory diagnostic, so `Display` here is part of the error contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fields::FieldSet;

/// One sort key: a column name plus its per-key direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub name: String,
    pub desc: bool,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote_field_name(&self.name))?;
        if self.desc {
            write!(f, " desc")?;
        }
        Ok(())
    }
}

/// Parsed `sort [by (...)] [desc]` clause.
///
/// An empty key list means "sort by the concatenation of all columns".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub by_fields: Vec<SortKey>,
    pub desc: bool,
}

impl SortConfig {
    pub fn by_all_columns(&self) -> bool {
        self.by_fields.is_empty()
    }

    /// Effective direction for key `key_idx`: per-key descending XOR the
    /// global flag. In all-columns mode the synthesized key follows the
    /// global flag alone.
    pub fn effective_desc(&self, key_idx: usize) -> bool {
        let per_key = self.by_fields.get(key_idx).map_or(false, |k| k.desc);
        per_key != self.desc
    }

    /// Propagate column requirements to a surrounding pipeline so upstream
    /// stages can prune. Sorting by all columns needs everything.
    pub fn update_needed_fields(&self, needed: &mut FieldSet, unneeded: &mut FieldSet) {
        if self.by_fields.is_empty() {
            needed.add("*");
            unneeded.reset();
        } else {
            for key in &self.by_fields {
                needed.add(&key.name);
                unneeded.remove(&key.name);
            }
        }
    }
}

impl fmt::Display for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sort")?;
        if !self.by_fields.is_empty() {
            write!(f, " by (")?;
            for (i, key) in self.by_fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}")?;
            }
            write!(f, ")")?;
        }
        if self.desc {
            write!(f, " desc")?;
        }
        Ok(())
    }
}

/// True when `name` can appear unquoted in a printed clause.
pub fn is_plain_field_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Render a field name for the printed clause, JSON-quoting it when it
/// contains non-identifier characters.
pub fn quote_field_name(name: &str) -> String {
    if is_plain_field_name(name) {
        name.to_string()
    } else {
        serde_json::to_string(name).unwrap_or_else(|_| name.to_string())
    }
}
