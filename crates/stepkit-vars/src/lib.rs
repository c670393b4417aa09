//! Per-scenario variable table for stepkit.
//!
//! Holds the name/value pairs placeholders substitute from. Lifecycle is
//! one scenario: the resolver clears it on scenario reset, unlike the
//! token history which spans the whole run.

use std::collections::HashMap;

/// Scenario-scoped mapping from variable name to resolved value.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    entries: HashMap<String, String>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous one under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Drop a single entry, returning its old value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    /// Drop every entry. Called at scenario boundaries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
