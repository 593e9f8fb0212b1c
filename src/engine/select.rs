//! Single-core selection: a block-bitmap scan over a column (or a
//! caller-supplied value vector, when selecting over a previous
//! result via a position-vector remap).
//!
//! Values are scanned `block_size` elements at a time. Each block's
//! matches are marked into a 64-bit-word bitmap, then drained with
//! `trailing_zeros` bit extraction into a small staging buffer that gets
//! flushed into the growing result vector once full. This two-level
//! buffering is what lets the scan stay branch-light in the common case
//! (mark everything first, extract positions only once per block) while
//! still writing matches out incrementally instead of all at the end.

use crate::config::{DEFAULT_BLOCK_SIZE, DEFAULT_STAGING_SIZE};
use crate::engine::comparator::Comparator;
use crate::index::ColumnIndex;

pub(crate) struct Bitmap {
    words: Vec<u64>,
}

impl Bitmap {
    pub(crate) fn new(num_bits: usize) -> Self {
        Bitmap { words: vec![0u64; (num_bits + 63) / 64] }
    }

    #[inline]
    pub(crate) fn set(&mut self, bit: usize) {
        self.words[bit / 64] |= 1u64 << (bit % 64);
    }

    pub(crate) fn clear(&mut self) {
        for w in &mut self.words {
            *w = 0;
        }
    }

    /// Drain every set bit in ascending order, invoking `f` with each
    /// bit index, via trailing-zero extraction.
    pub(crate) fn drain(&mut self, mut f: impl FnMut(usize)) {
        for (word_idx, word) in self.words.iter_mut().enumerate() {
            while *word != 0 {
                let bit = word.trailing_zeros() as usize;
                f(word_idx * 64 + bit);
                *word &= *word - 1;
            }
        }
    }
}

/// Scan `values` block by block, returning the ascending positions of
/// every element matching `comparator`.
pub fn select_single_core(values: &[i32], comparator: &Comparator) -> Vec<u32> {
    select_single_core_with_block_size(values, comparator, DEFAULT_BLOCK_SIZE)
}

pub fn select_single_core_with_block_size(
    values: &[i32],
    comparator: &Comparator,
    block_size: usize,
) -> Vec<u32> {
    let mut result = Vec::new();
    let mut staging: Vec<u32> = Vec::with_capacity(DEFAULT_STAGING_SIZE);
    let mut bitmap = Bitmap::new(block_size);

    for (block_idx, block) in values.chunks(block_size).enumerate() {
        bitmap.clear();
        for (i, &v) in block.iter().enumerate() {
            if comparator.should_include(v) {
                bitmap.set(i);
            }
        }
        let base = (block_idx * block_size) as u32;
        bitmap.drain(|bit| {
            staging.push(base + bit as u32);
            if staging.len() == DEFAULT_STAGING_SIZE {
                result.extend_from_slice(&staging);
                staging.clear();
            }
        });
    }
    result.extend_from_slice(&staging);
    result
}

/// Select over a previous result: `positions[i]` is remapped through,
/// so the output is a subset of `positions` rather than `0..values.len()`.
/// `positions` and `values` must be the same length. This is a caller
/// contract (see the length-mismatch Open Question), not a checked
/// invariant.
pub fn select_over_positions(positions: &[u32], values: &[i32], comparator: &Comparator) -> Vec<u32> {
    let mut out = Vec::new();
    for (&p, &v) in positions.iter().zip(values.iter()) {
        if comparator.should_include(v) {
            out.push(p);
        }
    }
    out
}

/// Index-accelerated shortcut: when the predicate carries a low bound and
/// an index already exists, resolve the matching span directly via
/// `lookup_left`/`lookup_right` instead of scanning every element, then
/// translate the sorted-mirror span back to original positions and sort
/// them ascending. The dispatcher's `select` path reaches for this
/// whenever a catalog column has an index and the comparator has a low
/// bound, falling back to a full scan otherwise.
pub fn select_with_index(index: &ColumnIndex, comparator: &Comparator) -> Vec<u32> {
    let lo = match comparator.low_type {
        crate::types::ComparatorType::GreaterOrEqual => index.lookup_left(comparator.low),
        _ => 0,
    };
    let hi = match comparator.high_type {
        crate::types::ComparatorType::Less => index.lookup_left(comparator.high),
        _ => index.sorted_data.len(),
    };
    if lo >= hi {
        return Vec::new();
    }
    let mut out: Vec<u32> = index.positions[lo..hi].to_vec();
    out.sort_unstable();
    out
}
