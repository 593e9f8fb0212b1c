//! Ambient per-session counters. There is no structured logging crate
//! in this engine (see DESIGN.md); `Metrics` fills the same observability
//! role the original filled with conditionally-compiled `log_perf` calls,
//! as plain in-memory counters a session can inspect or a test can
//! assert against.

#[derive(Debug, Default, Clone, Copy)]
pub struct Metrics {
    pub scans_executed: u64,
    pub rows_scanned: u64,
    pub joins_executed: u64,
    pub join_output_rows: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scan(&mut self, rows: u64) {
        self.scans_executed += 1;
        self.rows_scanned += rows;
    }

    pub fn record_join(&mut self, output_rows: u64) {
        self.joins_executed += 1;
        self.join_output_rows += output_rows;
    }
}
