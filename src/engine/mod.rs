pub mod aggregate;
pub mod arithmetic;
pub mod batch;
pub mod comparator;
pub mod fetch;
pub mod join;
pub mod print;
pub mod select;
pub mod select_parallel;

pub use comparator::Comparator;
