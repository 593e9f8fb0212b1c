//! Row-major CSV rendering for `print`, the one operator whose reply is
//! textual rather than a status code. No trailing newline after the
//! last row, matching `handle_print`.

use crate::storage::column::{HandleColumn, HandleData};

pub fn render(columns: &[HandleColumn]) -> String {
    let num_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
    let mut out = String::new();
    for row in 0..num_rows {
        if row > 0 {
            out.push('\n');
        }
        for (col_idx, col) in columns.iter().enumerate() {
            if col_idx > 0 {
                out.push(',');
            }
            match &col.data {
                HandleData::Int(v) => out.push_str(&v[row].to_string()),
                HandleData::Long(v) => out.push_str(&v[row].to_string()),
                HandleData::Double(v) => out.push_str(&format!("{:.2}", v[row])),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, data: HandleData) -> HandleColumn {
        HandleColumn::new(name.to_string(), data, None)
    }

    #[test]
    fn renders_row_major_with_no_trailing_newline() {
        let cols = vec![
            col("a", HandleData::Int(vec![1, 2, 3])),
            col("b", HandleData::Int(vec![10, 20, 30])),
        ];
        let rendered = render(&cols);
        assert_eq!(rendered, "1,10\n2,20\n3,30");
    }

    #[test]
    fn mixed_types_format_per_column() {
        let cols = vec![
            col("a", HandleData::Int(vec![1])),
            col("b", HandleData::Double(vec![2.5])),
            col("c", HandleData::Long(vec![100])),
        ];
        assert_eq!(render(&cols), "1,2.50,100");
    }

    #[test]
    fn no_columns_renders_empty_string() {
        assert_eq!(render(&[]), "");
    }
}
