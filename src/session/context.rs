//! Per-session state: the handle pool, the pending batch queue, and the
//! two session-wide flags (`batching_on`, `force_single_core`) that
//! change how later operators are dispatched.

use crate::engine::batch::QueuedSelect;
use crate::error::{EngineError, Result};
use crate::session::handle_pool::HandlePool;
use crate::session::metrics::Metrics;

pub struct SessionContext {
    pub handle_pool: HandlePool,
    pub batching_on: bool,
    pub force_single_core: bool,
    pub metrics: Metrics,
    pending_batch: Vec<QueuedSelect>,
    /// The column every queued select must share, fixed by the first
    /// select added to the batch.
    batch_source: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        SessionContext {
            handle_pool: HandlePool::new(),
            batching_on: false,
            force_single_core: false,
            metrics: Metrics::new(),
            pending_batch: Vec::new(),
            batch_source: None,
        }
    }

    pub fn start_batch(&mut self) {
        self.batching_on = true;
        self.pending_batch.clear();
        self.batch_source = None;
    }

    /// Queue a select against `source_column`. Rejected with
    /// `EngineError::Execution` if the batch already has a different
    /// source column queued: a batch scans one source column at a time,
    /// enforced here rather than left to caller discipline.
    pub fn queue_select(&mut self, source_column: &str, op: QueuedSelect) -> Result<()> {
        match &self.batch_source {
            None => self.batch_source = Some(source_column.to_string()),
            Some(existing) if existing != source_column => {
                return Err(EngineError::Execution(format!(
                    "batch already scanning {existing}, cannot add a select on {source_column}"
                )));
            }
            _ => {}
        }
        self.pending_batch.push(op);
        Ok(())
    }

    /// End the batch, returning its source column name and queued
    /// predicates for `exec_batch_select` to run.
    pub fn stop_batch(&mut self) -> (Option<String>, Vec<QueuedSelect>) {
        self.batching_on = false;
        let source = self.batch_source.take();
        (source, std::mem::take(&mut self.pending_batch))
    }

    pub fn is_batching(&self) -> bool {
        self.batching_on
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::comparator::Comparator;

    fn op(name: &str) -> QueuedSelect {
        QueuedSelect { comparator: Comparator::at_least(0), result_handle: name.to_string() }
    }

    #[test]
    fn batch_rejects_a_second_source_column() {
        let mut ctx = SessionContext::new();
        ctx.start_batch();
        ctx.queue_select("db.t.a", op("h1")).unwrap();
        let err = ctx.queue_select("db.t.b", op("h2")).unwrap_err();
        assert!(matches!(err, EngineError::Execution(_)));
    }

    #[test]
    fn stop_batch_drains_queue_and_clears_flag() {
        let mut ctx = SessionContext::new();
        ctx.start_batch();
        ctx.queue_select("db.t.a", op("h1")).unwrap();
        ctx.queue_select("db.t.a", op("h2")).unwrap();
        let (source, ops) = ctx.stop_batch();
        assert_eq!(source.as_deref(), Some("db.t.a"));
        assert_eq!(ops.len(), 2);
        assert!(!ctx.is_batching());
    }
}
