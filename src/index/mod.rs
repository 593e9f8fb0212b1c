//! Per-column index model: a sorted mirror with an optional fence
//! B-tree accelerator on top.

pub mod btree;
pub mod catalog_ops;
pub mod sort;

use crate::types::{Clustering, IndexKind};
use btree::FenceBtree;
use sort::{binary_search_left, binary_search_right, build_sorted_mirror};

pub struct ColumnIndex {
    pub kind: IndexKind,
    pub clustering: Clustering,
    pub sorted_data: Vec<i32>,
    pub positions: Vec<u32>,
    pub tree: Option<FenceBtree>,
}

impl ColumnIndex {
    /// Build an index over `values`: always constructs the sorted
    /// mirror, and additionally a fence B-tree when `kind` is
    /// [`IndexKind::Btree`].
    pub fn build(values: &[i32], kind: IndexKind, clustering: Clustering, fanout: usize) -> Self {
        let (sorted_data, positions) = build_sorted_mirror(values);
        let tree = if kind == IndexKind::Btree {
            Some(FenceBtree::build(&sorted_data, fanout))
        } else {
            None
        };
        ColumnIndex { kind, clustering, sorted_data, positions, tree }
    }

    /// Smallest position `i` with `sorted_data[i] >= key`, or
    /// `sorted_data.len()` if none.
    pub fn lookup_left(&self, key: i32) -> usize {
        match &self.tree {
            Some(t) => t.lookup_left(key, self.sorted_data.len()),
            None => binary_search_left(&self.sorted_data, key),
        }
    }

    /// Largest position `i` with `sorted_data[i] <= key`, or `None` if
    /// none.
    pub fn lookup_right(&self, key: i32) -> Option<usize> {
        match &self.tree {
            Some(t) => t.lookup_right(key),
            None => binary_search_right(&self.sorted_data, key),
        }
    }

    /// After clustering reorders the underlying column, the sorted
    /// mirror no longer needs a permutation: `positions[i] = i`.
    pub fn reset_positions_to_identity(&mut self) {
        for (i, p) in self.positions.iter_mut().enumerate() {
            *p = i as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_index_falls_back_to_binary_search() {
        let values = [9, 1, 5, 1];
        let idx = ColumnIndex::build(&values, IndexKind::Sorted, Clustering::Unclustered, 4);
        assert!(idx.tree.is_none());
        assert_eq!(idx.lookup_left(1), 0);
        assert_eq!(idx.lookup_right(5), Some(2));
    }

    #[test]
    fn btree_index_agrees_with_sorted_index() {
        let values: Vec<i32> = (0..2000).map(|i| i % 37).collect();
        let sorted_idx = ColumnIndex::build(&values, IndexKind::Sorted, Clustering::Unclustered, 64);
        let btree_idx = ColumnIndex::build(&values, IndexKind::Btree, Clustering::Unclustered, 64);
        for key in 0..40 {
            assert_eq!(sorted_idx.lookup_left(key), btree_idx.lookup_left(key));
            assert_eq!(sorted_idx.lookup_right(key), btree_idx.lookup_right(key));
        }
    }
}
