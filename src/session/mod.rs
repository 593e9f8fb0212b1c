pub mod context;
pub mod handle_pool;
pub mod metrics;

pub use context::SessionContext;
pub use handle_pool::HandlePool;
pub use metrics::Metrics;
