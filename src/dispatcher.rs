//! Dispatcher: routes one parsed operator either into the session's
//! batch queue (when batching is armed and the operator is a `select`)
//! or straight to execution, then builds the reply envelope. This is the
//! boundary where [`crate::error::EngineError`] gets turned into a
//! status code instead of propagating out of the session.

use crate::engine::batch::{self, QueuedSelect};
use crate::engine::comparator::Comparator;
use crate::engine::{aggregate, arithmetic, fetch, join, print, select, select_parallel};
use crate::error::{EngineError, Result};
use crate::session::context::SessionContext;
use crate::storage::catalog::Catalog;
use crate::storage::column::{ColumnStats, HandleColumn, HandleData};
use crate::types::{AggregateKind, ArithmeticKind, Clustering, IndexKind, JoinKind};

/// A single parsed query. Parsing the textual grammar that produces
/// these is outside this crate's scope; the dispatcher only needs the
/// already-structured operator.
pub enum Operator {
    CreateDb { name: String },
    CreateTable { name: String },
    CreateColumn { table: String, name: String },
    CreateIndex { table: String, column: String, kind: IndexKind, clustering: Clustering },
    Insert { table: String, values: Vec<i32> },
    Select { source: SelectSource, comparator: Comparator, result_name: String },
    Fetch { column: String, positions_handle: String, result_name: String },
    Aggregate { kind: AggregateKind, source: AggregateSource, result_name: String },
    Arithmetic { kind: ArithmeticKind, lhs_handle: String, rhs_handle: String, result_name: String },
    Print { handles: Vec<String> },
    Join {
        kind: JoinKind,
        left_pos_handle: String,
        left_val_handle: String,
        right_pos_handle: String,
        right_val_handle: String,
        result_left_name: String,
        result_right_name: String,
    },
    StartBatch,
    StopBatch,
    SingleCore(bool),
}

/// Where a `select` reads values from: a catalog column (by name) or a
/// previously fetched handle (the `ref_posns` remap case).
pub enum SelectSource {
    Column(String),
    Handle(String),
}

/// Where an aggregate reads values from: a catalog column (by name, O(1)
/// via its maintained `ColumnStats`) or a session handle (O(1) when the
/// handle carries stats of its own, otherwise a scan over its values).
pub enum AggregateSource {
    Column(String),
    Handle(String),
}

pub enum Reply {
    Done,
    Csv(String),
    Error(EngineError),
}

pub fn dispatch(
    op: Operator,
    catalog: &mut Catalog,
    session: &mut SessionContext,
    multithread_threshold: usize,
    btree_fanout: usize,
) -> Reply {
    // A select only ever gets queued, never executed in-place, while
    // batching is armed; everything else always executes immediately,
    // matching `add_query_to_batch`'s "rejects non-SELECT ops" rule.
    if session.is_batching() {
        if let Operator::Select { source, comparator, result_name } = op {
            return queue_select(source, comparator, result_name, session);
        }
        if let Operator::StopBatch = op {
            return run_stop_batch(catalog, session);
        }
    }

    match execute(op, catalog, session, multithread_threshold, btree_fanout) {
        Ok(reply) => reply,
        Err(e) => Reply::Error(e),
    }
}

fn queue_select(source: SelectSource, comparator: Comparator, result_name: String, session: &mut SessionContext) -> Reply {
    let source_key = match &source {
        SelectSource::Column(c) => c.clone(),
        SelectSource::Handle(h) => h.clone(),
    };
    match session.queue_select(&source_key, QueuedSelect { comparator, result_handle: result_name }) {
        Ok(()) => Reply::Done,
        Err(e) => Reply::Error(e),
    }
}

fn run_stop_batch(catalog: &mut Catalog, session: &mut SessionContext) -> Reply {
    let (source, ops) = session.stop_batch();
    let Some(source) = source else { return Reply::Done };
    let result = (|| -> Result<()> {
        let col = catalog.get_column(&source)?;
        let values = col.as_slice().to_vec();
        let results = batch::batch_execute(&values, &ops);
        session.metrics.record_scan(values.len() as u64);
        for (op, positions) in ops.iter().zip(results.into_iter()) {
            let stats = ColumnStats::from_values(&positions.iter().map(|&p| p as i32).collect::<Vec<_>>());
            session.handle_pool.create(&op.result_handle, HandleData::Int(positions.into_iter().map(|p| p as i32).collect()), Some(stats));
        }
        Ok(())
    })();
    match result {
        Ok(()) => Reply::Done,
        Err(e) => Reply::Error(e),
    }
}

fn execute(
    op: Operator,
    catalog: &mut Catalog,
    session: &mut SessionContext,
    multithread_threshold: usize,
    btree_fanout: usize,
) -> Result<Reply> {
    match op {
        Operator::CreateDb { name } => {
            catalog.create_db(&name)?;
            Ok(Reply::Done)
        }
        Operator::CreateTable { name } => {
            catalog.create_table(&name)?;
            Ok(Reply::Done)
        }
        Operator::CreateColumn { table, name } => {
            catalog.create_column(&table, &name)?;
            Ok(Reply::Done)
        }
        Operator::CreateIndex { table, column, kind, clustering } => {
            catalog.create_index(&table, &column, kind, clustering, btree_fanout)?;
            Ok(Reply::Done)
        }
        Operator::Insert { table, values } => {
            let db = catalog.db.as_mut().ok_or_else(|| EngineError::NotFound("no active database".into()))?;
            db.get_table_mut(&table)?.insert_row(&values)?;
            Ok(Reply::Done)
        }
        Operator::Select { source, comparator, result_name } => {
            let positions = match source {
                SelectSource::Column(spec) => {
                    let col = catalog.get_column(&spec)?;
                    let has_low_bound = comparator.low_type == crate::types::ComparatorType::GreaterOrEqual;
                    match col.index.as_ref() {
                        Some(index) if has_low_bound => {
                            let out = select::select_with_index(index, &comparator);
                            session.metrics.record_scan(out.len() as u64);
                            out
                        }
                        _ => {
                            let values = col.as_slice();
                            let out = if values.len() >= multithread_threshold && !session.force_single_core {
                                select_parallel::select_multi_core(values, &comparator, multithread_threshold)
                            } else {
                                select::select_single_core(values, &comparator)
                            };
                            session.metrics.record_scan(values.len() as u64);
                            out
                        }
                    }
                }
                SelectSource::Handle(name) => {
                    let handle = session
                        .handle_pool
                        .get(&name)
                        .ok_or_else(|| EngineError::NotFound(format!("handle {name}")))?;
                    let HandleData::Int(values) = &handle.data else {
                        return Err(EngineError::Execution("select source handle must be int-typed".into()));
                    };
                    select::select_single_core(values, &comparator)
                }
            };
            let stats = ColumnStats::from_values(&positions.iter().map(|&p| p as i32).collect::<Vec<_>>());
            session.handle_pool.create(&result_name, HandleData::Int(positions.into_iter().map(|p| p as i32).collect()), Some(stats));
            Ok(Reply::Done)
        }
        Operator::Fetch { column, positions_handle, result_name } => {
            let col = catalog.get_column(&column)?;
            let handle = session
                .handle_pool
                .get(&positions_handle)
                .ok_or_else(|| EngineError::NotFound(format!("handle {positions_handle}")))?;
            let HandleData::Int(positions) = &handle.data else {
                return Err(EngineError::Execution("fetch positions handle must be int-typed".into()));
            };
            let positions: Vec<u32> = positions.iter().map(|&p| p as u32).collect();
            let (values, stats) = fetch::fetch(&positions, col.as_slice());
            session.handle_pool.create(&result_name, HandleData::Int(values), Some(stats));
            Ok(Reply::Done)
        }
        Operator::Aggregate { kind, source, result_name } => {
            let (stats, count, values) = match source {
                AggregateSource::Column(spec) => {
                    let col = catalog.get_column(&spec)?;
                    (col.stats, col.num_elements, None)
                }
                AggregateSource::Handle(name) => {
                    let handle = session.handle_pool.get(&name).ok_or_else(|| EngineError::NotFound(format!("handle {name}")))?;
                    let HandleData::Int(values) = &handle.data else {
                        return Err(EngineError::Execution(format!("handle {name} is not int-typed")));
                    };
                    match handle.stats {
                        Some(stats) => (stats, values.len(), None),
                        None => (ColumnStats::EMPTY, values.len(), Some(values.clone())),
                    }
                }
            };
            match kind {
                AggregateKind::Min => {
                    let v = values.as_deref().map(aggregate::min_scan).unwrap_or_else(|| aggregate::min(&stats));
                    session.handle_pool.create(&result_name, HandleData::Long(vec![v]), None);
                }
                AggregateKind::Max => {
                    let v = values.as_deref().map(aggregate::max_scan).unwrap_or_else(|| aggregate::max(&stats));
                    session.handle_pool.create(&result_name, HandleData::Long(vec![v]), None);
                }
                AggregateKind::Sum => {
                    let v = values.as_deref().map(aggregate::sum_scan).unwrap_or_else(|| aggregate::sum(&stats));
                    session.handle_pool.create(&result_name, HandleData::Long(vec![v]), None);
                }
                AggregateKind::Avg => {
                    let v = values.as_deref().map(aggregate::avg_scan).unwrap_or_else(|| aggregate::avg(&stats, count));
                    session.handle_pool.create(&result_name, HandleData::Double(vec![v]), None);
                }
            }
            Ok(Reply::Done)
        }
        Operator::Arithmetic { kind, lhs_handle, rhs_handle, result_name } => {
            let lhs = handle_int_values(session, &lhs_handle)?;
            let rhs = handle_int_values(session, &rhs_handle)?;
            let op = match kind {
                ArithmeticKind::Add => arithmetic::ArithmeticOp::Add,
                ArithmeticKind::Sub => arithmetic::ArithmeticOp::Sub,
            };
            let (result, stats) = arithmetic::apply(op, &lhs, &rhs);
            session.handle_pool.create(&result_name, HandleData::Int(result), Some(stats));
            Ok(Reply::Done)
        }
        Operator::Print { handles } => {
            let columns: Result<Vec<&HandleColumn>> = handles
                .iter()
                .map(|h| session.handle_pool.get(h).ok_or_else(|| EngineError::NotFound(format!("handle {h}"))))
                .collect();
            let columns = columns?;
            let owned: Vec<HandleColumn> = columns
                .into_iter()
                .map(|c| HandleColumn::new(c.name.clone(), c.data.clone(), c.stats))
                .collect();
            Ok(Reply::Csv(print::render(&owned)))
        }
        Operator::Join {
            kind,
            left_pos_handle,
            left_val_handle,
            right_pos_handle,
            right_val_handle,
            result_left_name,
            result_right_name,
        } => {
            let left_pos = handle_int_values(session, &left_pos_handle)?;
            let left_vals = handle_int_values(session, &left_val_handle)?;
            let right_pos = handle_int_values(session, &right_pos_handle)?;
            let right_vals = handle_int_values(session, &right_val_handle)?;
            let left_pos_u32: Vec<u32> = left_pos.iter().map(|&p| p as u32).collect();
            let right_pos_u32: Vec<u32> = right_pos.iter().map(|&p| p as u32).collect();
            let (out_left, out_right) = join::exec_join(kind, &left_vals, &left_pos_u32, &right_vals, &right_pos_u32);
            session.metrics.record_join(out_left.len() as u64);
            session.handle_pool.create(&result_left_name, HandleData::Int(out_left.into_iter().map(|p| p as i32).collect()), None);
            session.handle_pool.create(&result_right_name, HandleData::Int(out_right.into_iter().map(|p| p as i32).collect()), None);
            Ok(Reply::Done)
        }
        Operator::StartBatch => {
            session.start_batch();
            Ok(Reply::Done)
        }
        Operator::StopBatch => run_stop_batch_ok(catalog, session),
        Operator::SingleCore(on) => {
            session.force_single_core = on;
            Ok(Reply::Done)
        }
    }
}

fn run_stop_batch_ok(catalog: &mut Catalog, session: &mut SessionContext) -> Result<Reply> {
    match run_stop_batch(catalog, session) {
        Reply::Done => Ok(Reply::Done),
        Reply::Error(e) => Err(e),
        Reply::Csv(_) => Ok(Reply::Done),
    }
}

fn handle_int_values(session: &SessionContext, name: &str) -> Result<Vec<i32>> {
    let handle = session.handle_pool.get(name).ok_or_else(|| EngineError::NotFound(format!("handle {name}")))?;
    match &handle.data {
        HandleData::Int(v) => Ok(v.clone()),
        _ => Err(EngineError::Execution(format!("handle {name} is not int-typed"))),
    }
}
