//! Range predicate: `p_low <= x < p_high`, with either bound optionable
//! out, and an optional position-vector remap for selecting over a
//! previous result rather than a raw column.

use crate::types::ComparatorType;

#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    pub low_type: ComparatorType,
    pub low: i32,
    pub high_type: ComparatorType,
    pub high: i32,
}

impl Comparator {
    pub fn range(low: i32, high: i32) -> Self {
        Comparator {
            low_type: ComparatorType::GreaterOrEqual,
            low,
            high_type: ComparatorType::Less,
            high,
        }
    }

    pub fn at_least(low: i32) -> Self {
        Comparator {
            low_type: ComparatorType::GreaterOrEqual,
            low,
            high_type: ComparatorType::None,
            high: 0,
        }
    }

    pub fn less_than(high: i32) -> Self {
        Comparator { low_type: ComparatorType::None, low: 0, high_type: ComparatorType::Less, high }
    }

    #[inline]
    pub fn should_include(&self, value: i32) -> bool {
        let low_ok = match self.low_type {
            ComparatorType::None => true,
            ComparatorType::GreaterOrEqual => value >= self.low,
            ComparatorType::Less => value < self.low,
        };
        let high_ok = match self.high_type {
            ComparatorType::None => true,
            ComparatorType::GreaterOrEqual => value >= self.high,
            ComparatorType::Less => value < self.high,
        };
        low_ok && high_ok
    }
}
