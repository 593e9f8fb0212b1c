//! Session-local handle pool: every query result that gets a name
//! (`fetch`, `aggregate`, `arithmetic`) lands here as a
//! `"handle_"`-prefixed column, looked up by newest-first linear scan so
//! a later `create_new_handle` with a reused name shadows an earlier one
//! without needing to find and overwrite it.
//!
//! Handles are referred to by name, never by pointer or index, into this
//! pool. A raw pointer into a growing `Vec` would dangle across a
//! reallocation; name-based lookup sidesteps that entirely.

use crate::storage::column::{ColumnStats, HandleColumn, HandleData};

pub struct HandlePool {
    handles: Vec<HandleColumn>,
}

impl HandlePool {
    pub fn new() -> Self {
        HandlePool { handles: Vec::new() }
    }

    /// Create a new handle named `"handle_" + name` holding `data`.
    pub fn create(&mut self, name: &str, data: HandleData, stats: Option<ColumnStats>) {
        let prefixed = format!("handle_{name}");
        self.handles.push(HandleColumn::new(prefixed, data, stats));
    }

    /// Newest-first linear lookup by exact name (already prefixed).
    pub fn get(&self, name: &str) -> Option<&HandleColumn> {
        self.handles.iter().rev().find(|h| h.name == name)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for HandlePool {
    fn default() -> Self {
        Self::new()
    }
}
