//! Tunable constants for storage layout and the selection engine.
//!
//! These mirror the `#define`s the original engine compiled in
//! (`NUM_ELEMENTS_TO_MULTITHREAD`, block/staging buffer sizes, the fence
//! B-tree fanout) but are ordinary runtime fields here, overridable from
//! the environment so a test or a deployment can tune them without a
//! rebuild.

use std::env;

/// Threshold, in elements, above which a scan fans out across cores.
pub const DEFAULT_MULTITHREAD_THRESHOLD: usize = 10_000;

/// Elements per bitmap block in the single-core scan.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Size of the staging buffer that gets flushed into the result vector.
pub const DEFAULT_STAGING_SIZE: usize = 256;

/// Fanout of a freshly built fence B-tree.
pub const DEFAULT_BTREE_FANOUT: usize = 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root directory under which `<db>.meta` and `<db>.<table>.<col>.bin`
    /// files live.
    pub storage_root: std::path::PathBuf,
    /// Unix domain socket path the server binary listens on.
    pub socket_path: std::path::PathBuf,
    pub multithread_threshold: usize,
    pub block_size: usize,
    pub staging_size: usize,
    pub btree_fanout: usize,
}

impl ServerConfig {
    /// Build a config from defaults, overridden by environment variables
    /// (`COLDB_STORAGE_ROOT`, `COLDB_SOCKET_PATH`, `COLDB_MT_THRESHOLD`,
    /// `COLDB_BLOCK_SIZE`, `COLDB_BTREE_FANOUT`).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("COLDB_STORAGE_ROOT") {
            cfg.storage_root = v.into();
        }
        if let Ok(v) = env::var("COLDB_SOCKET_PATH") {
            cfg.socket_path = v.into();
        }
        if let Some(v) = env_usize("COLDB_MT_THRESHOLD") {
            cfg.multithread_threshold = v;
        }
        if let Some(v) = env_usize("COLDB_BLOCK_SIZE") {
            cfg.block_size = v;
        }
        if let Some(v) = env_usize("COLDB_BTREE_FANOUT") {
            cfg.btree_fanout = v;
        }
        cfg
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage_root: "disk".into(),
            socket_path: "/tmp/coldb.sock".into(),
            multithread_threshold: DEFAULT_MULTITHREAD_THRESHOLD,
            block_size: DEFAULT_BLOCK_SIZE,
            staging_size: DEFAULT_STAGING_SIZE,
            btree_fanout: DEFAULT_BTREE_FANOUT,
        }
    }
}
