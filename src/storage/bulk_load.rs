//! CSV bulk load: the receiving half of the wire's `CSV_TRANSFER`
//! framing, used by `load("path")` to populate a table column-by-column
//! without going through per-row `insert`.

use crate::error::Result;
use crate::storage::catalog::Table;
use crate::wire::CsvColumnBlock;

/// Append each block's values into the matching column, in column
/// order. Stops at the first terminator block (`num_elements == 0`),
/// matching the `CSV_TRANSFER` sentinel.
pub fn load_blocks(table: &mut Table, blocks: &[CsvColumnBlock]) -> Result<()> {
    for block in blocks {
        if block.metadata.is_terminator() {
            break;
        }
        let col = table.get_column_mut(&block.metadata.name)?;
        for &v in &block.values {
            col.append(v)?;
        }
    }
    Ok(())
}
