//! Multi-core selection: the column is split into contiguous,
//! equal-sized chunks, one per worker, each scanned independently with
//! the same block-bitmap algorithm as the single-core path. Because
//! chunks are contiguous and processed independently, concatenating the
//! per-chunk results in chunk order reproduces the column's global
//! ascending position order. No merge step beyond that concatenation
//! is needed.
//!
//! Falls back to the single-core scan below
//! [`crate::config::DEFAULT_MULTITHREAD_THRESHOLD`] elements, since
//! thread fan-out overhead dominates at small sizes.

use crate::engine::comparator::Comparator;
use crate::engine::select::select_single_core_with_block_size;

pub fn select_multi_core(values: &[i32], comparator: &Comparator, threshold: usize) -> Vec<u32> {
    if values.len() < threshold {
        return select_single_core_with_block_size(values, comparator, crate::config::DEFAULT_BLOCK_SIZE);
    }

    let num_workers = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1).max(1);
    let chunk_size = (values.len() + num_workers - 1) / num_workers;

    let chunk_results: Vec<Vec<u32>> = std::thread::scope(|scope| {
        let handles: Vec<_> = values
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(|| select_single_core_with_block_size(chunk, comparator, crate::config::DEFAULT_BLOCK_SIZE)))
            .collect();
        handles.into_iter().map(|h| h.join().expect("scan worker panicked")).collect()
    });

    let mut merged = Vec::with_capacity(chunk_results.iter().map(Vec::len).sum());
    for (chunk_idx, local_positions) in chunk_results.into_iter().enumerate() {
        let base = (chunk_idx * chunk_size) as u32;
        merged.extend(local_positions.into_iter().map(|p| p + base));
    }
    merged
}
