//! Element-wise add/sub over two equal-length `i32` handle columns,
//! recomputing stats from scratch over the result (there's no cheaper
//! incremental update when every element changes).

use crate::storage::column::ColumnStats;

#[derive(Debug, Clone, Copy)]
pub enum ArithmeticOp {
    Add,
    Sub,
}

pub fn apply(op: ArithmeticOp, lhs: &[i32], rhs: &[i32]) -> (Vec<i32>, ColumnStats) {
    assert_eq!(lhs.len(), rhs.len(), "arithmetic operands must have equal length");
    let out: Vec<i32> = lhs
        .iter()
        .zip(rhs.iter())
        .map(|(&a, &b)| match op {
            ArithmeticOp::Add => a.wrapping_add(b),
            ArithmeticOp::Sub => a.wrapping_sub(b),
        })
        .collect();
    let stats = ColumnStats::from_values(&out);
    (out, stats)
}
