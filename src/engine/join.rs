//! Equi-join over two position/value vector pairs (the output of two
//! prior `fetch`es). Both strategies return `(left_positions,
//! right_positions)`, one pair per matching row, in left-major order.

use crate::types::JoinKind;

pub fn exec_join(
    kind: JoinKind,
    left_vals: &[i32],
    left_pos: &[u32],
    right_vals: &[i32],
    right_pos: &[u32],
) -> (Vec<u32>, Vec<u32>) {
    match kind {
        JoinKind::NestedLoop => nested_loop_join(left_vals, left_pos, right_vals, right_pos),
        // Both alias to the naive hash join, as in the original, whose
        // "grace" and plain "hash" dispatch entries never diverged from it.
        JoinKind::NaiveHash | JoinKind::GraceHash | JoinKind::Hash => {
            naive_hash_join(left_vals, left_pos, right_vals, right_pos)
        }
    }
}

/// O(|L| * |R|). The result is sized up front and then truncated, since
/// the match count isn't known ahead of time but matches are appended
/// in a fixed nested order.
pub fn nested_loop_join(
    left_vals: &[i32],
    left_pos: &[u32],
    right_vals: &[i32],
    right_pos: &[u32],
) -> (Vec<u32>, Vec<u32>) {
    let mut out_left = Vec::new();
    let mut out_right = Vec::new();
    for (&lv, &lp) in left_vals.iter().zip(left_pos) {
        for (&rv, &rp) in right_vals.iter().zip(right_pos) {
            if lv == rv {
                out_left.push(lp);
                out_right.push(rp);
            }
        }
    }
    (out_left, out_right)
}

/// Build a chained hash table over the left (build) side, bucketed by
/// `value % num_buckets` with `num_buckets = left_vals.len()`, then probe
/// with the right side in two passes: first to count exact output size,
/// then to materialize without reallocation.
pub fn naive_hash_join(
    left_vals: &[i32],
    left_pos: &[u32],
    right_vals: &[i32],
    right_pos: &[u32],
) -> (Vec<u32>, Vec<u32>) {
    if left_vals.is_empty() || right_vals.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let num_buckets = left_vals.len();
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); num_buckets];
    for (i, &v) in left_vals.iter().enumerate() {
        buckets[bucket_of(v, num_buckets)].push(i);
    }

    let mut total = 0usize;
    for &rv in right_vals {
        for &li in &buckets[bucket_of(rv, num_buckets)] {
            if left_vals[li] == rv {
                total += 1;
            }
        }
    }

    let mut out_left = Vec::with_capacity(total);
    let mut out_right = Vec::with_capacity(total);
    for (&rv, &rp) in right_vals.iter().zip(right_pos) {
        for &li in &buckets[bucket_of(rv, num_buckets)] {
            if left_vals[li] == rv {
                out_left.push(left_pos[li]);
                out_right.push(rp);
            }
        }
    }
    (out_left, out_right)
}

#[inline]
fn bucket_of(value: i32, num_buckets: usize) -> usize {
    (value as i64).rem_euclid(num_buckets as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(n: usize) -> Vec<u32> {
        (0..n as u32).collect()
    }

    #[test]
    fn nested_loop_and_hash_join_agree_on_multi_match() {
        let left_vals = vec![1, 2, 2, 3];
        let right_vals = vec![2, 2, 4, 1];
        let left_pos = positions(left_vals.len());
        let right_pos = positions(right_vals.len());

        let mut nested = nested_loop_join(&left_vals, &left_pos, &right_vals, &right_pos);
        let mut hashed = naive_hash_join(&left_vals, &left_pos, &right_vals, &right_pos);
        let mut pairs_nested: Vec<(u32, u32)> = nested.0.drain(..).zip(nested.1.drain(..)).collect();
        let mut pairs_hashed: Vec<(u32, u32)> = hashed.0.drain(..).zip(hashed.1.drain(..)).collect();
        pairs_nested.sort();
        pairs_hashed.sort();
        assert_eq!(pairs_nested, pairs_hashed);
        // left=1 matches right pos 3; the two left-2 entries each match
        // both right-2 entries: 1 + 2*2 = 5 matching pairs.
        assert_eq!(pairs_nested.len(), 5);
    }

    #[test]
    fn empty_side_yields_no_matches() {
        let (l, r) = naive_hash_join(&[], &[], &[1, 2], &[0, 1]);
        assert!(l.is_empty() && r.is_empty());
    }

    #[test]
    fn exec_join_aliases_grace_and_hash_to_naive() {
        let left_vals = vec![5, 6];
        let right_vals = vec![6, 7];
        let left_pos = positions(2);
        let right_pos = positions(2);
        let naive = exec_join(JoinKind::NaiveHash, &left_vals, &left_pos, &right_vals, &right_pos);
        let grace = exec_join(JoinKind::GraceHash, &left_vals, &left_pos, &right_vals, &right_pos);
        let hash = exec_join(JoinKind::Hash, &left_vals, &left_pos, &right_vals, &right_pos);
        assert_eq!(naive, grace);
        assert_eq!(naive, hash);
    }
}
