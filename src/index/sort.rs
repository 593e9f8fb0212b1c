//! Sorted-mirror construction and clustering.
//!
//! Every index, btree or not, carries a `sorted_data`/`positions` pair: a
//! stable sort of the column's values with a parallel permutation vector
//! recording where each sorted value came from. `lookup_left`/
//! `lookup_right` always resolve against this mirror; the B-tree (when
//! present) is purely an accelerator over it.

/// Sort `values`, returning the sorted values and the permutation that
/// produced them (`positions[i]` is the original index of
/// `sorted[i]`). Ties keep their original relative order, matching a
/// stable sort over (value, original_index) pairs.
pub fn build_sorted_mirror(values: &[i32]) -> (Vec<i32>, Vec<u32>) {
    let mut positions: Vec<u32> = (0..values.len() as u32).collect();
    positions.sort_by_key(|&i| values[i as usize]);
    let sorted: Vec<i32> = positions.iter().map(|&i| values[i as usize]).collect();
    (sorted, positions)
}

/// Smallest index `i` such that `sorted[i] >= v`, or `sorted.len()` if no
/// such index exists.
pub fn binary_search_left(sorted: &[i32], v: i32) -> usize {
    sorted.partition_point(|&x| x < v)
}

/// Largest index `i` such that `sorted[i] <= v`, or `usize::MAX` (as a
/// "before the start" sentinel) if no such index exists. Callers clamp
/// this the same way `idx_lookup_right` clamps a negative result.
pub fn binary_search_right(sorted: &[i32], v: i32) -> Option<usize> {
    let first_greater = sorted.partition_point(|&x| x <= v);
    if first_greater == 0 {
        None
    } else {
        Some(first_greater - 1)
    }
}

/// Apply permutation `positions` to `values`, producing
/// `out[i] = values[positions[i]]`. Used both to build the sorted mirror
/// and, during clustering, to reorder every sibling column by the
/// clustered column's permutation.
pub fn reorder_by(values: &[i32], positions: &[u32]) -> Vec<i32> {
    positions.iter().map(|&p| values[p as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_mirror_tracks_original_positions() {
        let values = [30, 10, 20, 10];
        let (sorted, positions) = build_sorted_mirror(&values);
        assert_eq!(sorted, vec![10, 10, 20, 30]);
        for (i, &p) in positions.iter().enumerate() {
            assert_eq!(sorted[i], values[p as usize]);
        }
    }

    #[test]
    fn left_and_right_bounds_bracket_matching_range() {
        let sorted = [1, 3, 3, 3, 7, 9];
        assert_eq!(binary_search_left(&sorted, 3), 1);
        assert_eq!(binary_search_right(&sorted, 3), Some(3));
        assert_eq!(binary_search_left(&sorted, 0), 0);
        assert_eq!(binary_search_right(&sorted, 0), None);
        assert_eq!(binary_search_left(&sorted, 100), sorted.len());
        assert_eq!(binary_search_right(&sorted, 100), Some(sorted.len() - 1));
    }

    #[test]
    fn reorder_by_applies_permutation() {
        let values = [100, 200, 300];
        let positions = [2, 0, 1];
        assert_eq!(reorder_by(&values, &positions), vec![300, 100, 200]);
    }
}
