//! Field-name sets with `*` (all-fields) semantics, used for column pruning.

use std::collections::BTreeSet;

/// A set of column names where `*` swallows every name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    all: bool,
    names: BTreeSet<String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; `"*"` switches the set into all-fields mode and drops the
    /// individual entries.
    pub fn add(&mut self, name: &str) {
        if name == "*" {
            self.all = true;
            self.names.clear();
        } else if !self.all {
            self.names.insert(name.to_string());
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.names.remove(name);
    }

    pub fn reset(&mut self) {
        self.all = false;
        self.names.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all || self.names.contains(name)
    }

    pub fn contains_all(&self) -> bool {
        self.all
    }

    pub fn is_empty(&self) -> bool {
        !self.all && self.names.is_empty()
    }
}
