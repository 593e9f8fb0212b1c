pub mod bulk_load;
pub mod catalog;
pub mod column;

pub use catalog::{Catalog, Db, Table};
pub use column::{CatalogColumn, ColumnStats, HandleColumn, HandleData};
