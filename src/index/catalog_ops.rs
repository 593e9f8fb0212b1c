//! Glue between the index layer and the catalog: `create index` and
//! `cluster` as seen by a table, not just a single column.

use crate::error::Result;
use crate::index::sort::reorder_by;
use crate::index::ColumnIndex;
use crate::storage::catalog::Table;
use crate::types::{Clustering, IndexKind};

/// Build an index on `col_name`. When `clustering` is
/// [`Clustering::Clustered`], every sibling column in `table` is
/// physically reordered by the new index's permutation and the index's
/// own `positions` collapse to the identity, matching
/// `cluster_idx_on`'s "overwrite primary data with sorted_data, reset
/// positions" behavior.
pub fn create_index_on(
    table: &mut Table,
    col_name: &str,
    kind: IndexKind,
    clustering: Clustering,
    btree_fanout: usize,
) -> Result<()> {
    let col_idx = table.column_index(col_name)?;
    let values = table.columns[col_idx].as_slice().to_vec();
    let mut index = ColumnIndex::build(&values, kind, clustering, btree_fanout);

    if clustering == Clustering::Clustered {
        let positions = index.positions.clone();
        for (i, col) in table.columns.iter_mut().enumerate() {
            if i == col_idx {
                continue;
            }
            let reordered = reorder_by(col.as_slice(), &positions);
            col.overwrite(&reordered)?;
        }
        table.columns[col_idx].overwrite(&index.sorted_data)?;
        index.reset_positions_to_identity();
    }

    table.columns[col_idx].index = Some(index);
    Ok(())
}
