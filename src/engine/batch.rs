//! Batched shared-scan selection: several `select` calls that all read
//! the same source column get queued up and executed in a single pass
//! over that column instead of one pass per query.
//!
//! Each predicate keeps its own block bitmap; the outer block loop walks
//! the shared source once, marking every predicate's bitmap per
//! element, then drains each bitmap into its own result vector.

use crate::config::DEFAULT_BLOCK_SIZE;
use crate::engine::comparator::Comparator;
use crate::engine::select::Bitmap;

/// One queued select against the currently-armed batch column.
#[derive(Clone)]
pub struct QueuedSelect {
    pub comparator: Comparator,
    pub result_handle: String,
}

/// Evaluate every queued predicate against `values` in a single pass,
/// returning one result vector per queued select, in the same order as
/// `ops`.
pub fn batch_execute(values: &[i32], ops: &[QueuedSelect]) -> Vec<Vec<u32>> {
    let mut results: Vec<Vec<u32>> = vec![Vec::new(); ops.len()];
    let mut bitmaps: Vec<Bitmap> = (0..ops.len()).map(|_| Bitmap::new(DEFAULT_BLOCK_SIZE)).collect();

    for (block_idx, block) in values.chunks(DEFAULT_BLOCK_SIZE).enumerate() {
        for bm in &mut bitmaps {
            bm.clear();
        }
        for (i, &v) in block.iter().enumerate() {
            for (op, bm) in ops.iter().zip(bitmaps.iter_mut()) {
                if op.comparator.should_include(v) {
                    bm.set(i);
                }
            }
        }
        let base = (block_idx * DEFAULT_BLOCK_SIZE) as u32;
        for (result, bm) in results.iter_mut().zip(bitmaps.iter_mut()) {
            bm.drain(|bit| result.push(base + bit as u32));
        }
    }
    results
}
