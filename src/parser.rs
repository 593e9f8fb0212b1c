//! Textual query parsing: turns one line of the query language into a
//! [`crate::dispatcher::Operator`]. The full grammar (whitespace/comment
//! handling edge cases, every historical alias) is out of scope; this
//! covers the operators the engine actually executes, in the
//! `name=op(args)` assignment style the query language uses.

use crate::dispatcher::{AggregateSource, Operator, SelectSource};
use crate::engine::comparator::Comparator;
use crate::error::{EngineError, Result};
use crate::types::{AggregateKind, ArithmeticKind, Clustering, IndexKind, JoinKind};

/// Parse one trimmed, non-empty query line.
pub fn parse_line(line: &str) -> Result<Operator> {
    let line = line.trim();
    if let Some(eq) = find_top_level_eq(line) {
        let (lhs, rhs) = (line[..eq].trim(), line[eq + 1..].trim());
        return parse_assignment(lhs, rhs);
    }
    parse_command(line)
}

/// Find the first `=` that isn't inside the argument parentheses (so
/// `select(a,1,2)` with no assignment doesn't get misread).
fn find_top_level_eq(line: &str) -> Option<usize> {
    let paren = line.find('(')?;
    let eq = line.find('=')?;
    if eq < paren { Some(eq) } else { None }
}

fn parse_assignment(lhs: &str, rhs: &str) -> Result<Operator> {
    let (op_name, args) = split_call(rhs)?;
    match op_name {
        "select" => {
            let (source, comparator) = parse_select_args(&args)?;
            Ok(Operator::Select { source, comparator, result_name: lhs.to_string() })
        }
        "fetch" => {
            require_args(&args, 2, "fetch")?;
            Ok(Operator::Fetch { column: args[0].clone(), positions_handle: args[1].clone(), result_name: lhs.to_string() })
        }
        "min" | "max" | "sum" | "avg" => {
            require_args(&args, 1, op_name)?;
            let kind = match op_name {
                "min" => AggregateKind::Min,
                "max" => AggregateKind::Max,
                "sum" => AggregateKind::Sum,
                _ => AggregateKind::Avg,
            };
            let source = if args[0].starts_with("handle_") {
                AggregateSource::Handle(args[0].clone())
            } else {
                AggregateSource::Column(args[0].clone())
            };
            Ok(Operator::Aggregate { kind, source, result_name: lhs.to_string() })
        }
        "add" | "sub" => {
            require_args(&args, 2, op_name)?;
            let kind = if op_name == "add" { ArithmeticKind::Add } else { ArithmeticKind::Sub };
            Ok(Operator::Arithmetic { kind, lhs_handle: args[0].clone(), rhs_handle: args[1].clone(), result_name: lhs.to_string() })
        }
        "join" => {
            require_args(&args, 5, "join")?;
            let kind = parse_join_kind(&args[4])?;
            let names: Vec<&str> = lhs.split(',').map(str::trim).collect();
            if names.len() != 2 {
                return Err(EngineError::IncorrectFormat("join requires two result handles".into()));
            }
            Ok(Operator::Join {
                kind,
                left_pos_handle: args[0].clone(),
                left_val_handle: args[1].clone(),
                right_pos_handle: args[2].clone(),
                right_val_handle: args[3].clone(),
                result_left_name: names[0].to_string(),
                result_right_name: names[1].to_string(),
            })
        }
        other => Err(EngineError::UnknownCommand(other.to_string())),
    }
}

fn parse_command(line: &str) -> Result<Operator> {
    let (op_name, args) = split_call(line)?;
    match op_name {
        "create" => parse_create(&args),
        "relational_insert" | "insert" => {
            if args.len() < 2 {
                return Err(EngineError::IncorrectFormat("insert requires a table and at least one value".into()));
            }
            let values: std::result::Result<Vec<i32>, _> = args[1..].iter().map(|a| a.parse()).collect();
            let values = values.map_err(|_| EngineError::IncorrectFormat("insert values must be integers".into()))?;
            Ok(Operator::Insert { table: args[0].clone(), values })
        }
        "print" => Ok(Operator::Print { handles: args }),
        "batch_queries" => Ok(Operator::StartBatch),
        "batch_execute" => Ok(Operator::StopBatch),
        "single_core" => Ok(Operator::SingleCore(true)),
        "single_core_execute" => Ok(Operator::SingleCore(false)),
        other => Err(EngineError::UnknownCommand(other.to_string())),
    }
}

fn parse_create(args: &[String]) -> Result<Operator> {
    require_args(args, 2, "create")?;
    match args[0].as_str() {
        "db" => Ok(Operator::CreateDb { name: unquote(&args[1]) }),
        "tbl" | "table" => Ok(Operator::CreateTable { name: unquote(&args[1]) }),
        "col" | "column" => {
            require_args(args, 3, "create(col,...)")?;
            Ok(Operator::CreateColumn { table: args[2].clone(), name: unquote(&args[1]) })
        }
        "idx" | "index" => {
            require_args(args, 4, "create(idx,...)")?;
            let kind = match args[2].as_str() {
                "btree" => IndexKind::Btree,
                "sorted" => IndexKind::Sorted,
                other => return Err(EngineError::IncorrectFormat(format!("unknown index type {other}"))),
            };
            let clustering = match args[3].as_str() {
                "clustered" => Clustering::Clustered,
                "unclustered" => Clustering::Unclustered,
                other => return Err(EngineError::IncorrectFormat(format!("unknown clustering {other}"))),
            };
            let (table, column) = split_column_ref(&args[1])?;
            Ok(Operator::CreateIndex { table, column, kind, clustering })
        }
        other => Err(EngineError::IncorrectFormat(format!("unknown create target {other}"))),
    }
}

/// Accepts either `table.column` or `db.table.column`; the database
/// part is dropped since only one database is ever active.
fn split_column_ref(spec: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = spec.split('.').collect();
    match parts.as_slice() {
        [table, column] => Ok((table.to_string(), column.to_string())),
        [_db, table, column] => Ok((table.to_string(), column.to_string())),
        _ => Err(EngineError::IncorrectFormat(format!("expected table.column, got {spec}"))),
    }
}

fn parse_select_args(args: &[String]) -> Result<(SelectSource, Comparator)> {
    require_args(args, 3, "select")?;
    let source = if args[0].starts_with("handle_") {
        SelectSource::Handle(args[0].clone())
    } else {
        SelectSource::Column(args[0].clone())
    };
    let low = parse_bound(&args[1])?;
    let high = parse_bound(&args[2])?;
    let comparator = match (low, high) {
        (Some(l), Some(h)) => Comparator::range(l, h),
        (Some(l), None) => Comparator::at_least(l),
        (None, Some(h)) => Comparator::less_than(h),
        (None, None) => return Err(EngineError::IncorrectFormat("select requires at least one bound".into())),
    };
    Ok((source, comparator))
}

fn parse_bound(s: &str) -> Result<Option<i32>> {
    if s == "null" {
        Ok(None)
    } else {
        s.parse().map(Some).map_err(|_| EngineError::IncorrectFormat(format!("bad bound: {s}")))
    }
}

fn parse_join_kind(s: &str) -> Result<JoinKind> {
    match s {
        "nested-loop" | "nested_loop" => Ok(JoinKind::NestedLoop),
        "hash" => Ok(JoinKind::Hash),
        "naive-hash" | "naive_hash" => Ok(JoinKind::NaiveHash),
        "grace-hash" | "grace_hash" => Ok(JoinKind::GraceHash),
        other => Err(EngineError::IncorrectFormat(format!("unknown join type {other}"))),
    }
}

fn split_call(s: &str) -> Result<(&str, Vec<String>)> {
    let open = s.find('(').ok_or_else(|| EngineError::IncorrectFormat(format!("expected '(': {s}")))?;
    let close = s.rfind(')').ok_or_else(|| EngineError::IncorrectFormat(format!("expected ')': {s}")))?;
    if close < open {
        return Err(EngineError::IncorrectFormat(format!("mismatched parens: {s}")));
    }
    let name = s[..open].trim();
    let inner = &s[open + 1..close];
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(|a| a.trim().to_string()).collect()
    };
    Ok((name, args))
}

fn require_args(args: &[String], n: usize, what: &str) -> Result<()> {
    if args.len() < n {
        Err(EngineError::IncorrectFormat(format!("{what} requires {n} arguments, got {}", args.len())))
    } else {
        Ok(())
    }
}

fn unquote(s: &str) -> String {
    s.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_select_with_both_bounds() {
        let op = parse_line("posn1=select(db1.tbl1.col1,10,20)").unwrap();
        match op {
            Operator::Select { result_name, .. } => assert_eq!(result_name, "posn1"),
            _ => panic!("wrong operator"),
        }
    }

    #[test]
    fn parses_null_bound_as_unbounded() {
        let op = parse_line("p=select(db1.tbl1.col1,null,20)").unwrap();
        match op {
            Operator::Select { comparator, .. } => {
                assert!(!comparator.should_include(100));
                assert!(comparator.should_include(-1000));
            }
            _ => panic!("wrong operator"),
        }
    }

    #[test]
    fn parses_create_table_and_column() {
        assert!(matches!(parse_line("create(tbl,\"t1\",db1,2)").unwrap(), Operator::CreateTable { .. }));
        assert!(matches!(parse_line("create(col,\"a\",t1)").unwrap(), Operator::CreateColumn { .. }));
    }

    #[test]
    fn parses_join_with_two_result_handles() {
        let op = parse_line("l,r=join(p1,v1,p2,v2,hash)").unwrap();
        match op {
            Operator::Join { result_left_name, result_right_name, kind, .. } => {
                assert_eq!(result_left_name, "l");
                assert_eq!(result_right_name, "r");
                assert!(matches!(kind, JoinKind::Hash));
            }
            _ => panic!("wrong operator"),
        }
    }

    #[test]
    fn unknown_command_is_an_error_not_a_panic() {
        assert!(matches!(parse_line("bogus(1,2)"), Err(EngineError::UnknownCommand(_))));
    }
}
