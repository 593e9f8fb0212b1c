//! Accept loop: binds the Unix domain socket, loads or creates the
//! on-disk catalog, and drives every connection's queries through the
//! dispatcher. Only one client session is served at a time, matching
//! the single in-process session this engine supports.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;

use columnar_engine::config::ServerConfig;
use columnar_engine::dispatcher::{self, Operator, Reply};
use columnar_engine::parser;
use columnar_engine::session::SessionContext;
use columnar_engine::storage::Catalog;

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    let catalog = if config.storage_root.exists() {
        Catalog::load(&config.storage_root).context("loading catalog from disk")?
    } else {
        Catalog::new(&config.storage_root)
    };
    let catalog = Arc::new(Mutex::new(catalog));

    let _ = std::fs::remove_file(&config.socket_path);
    let listener = UnixListener::bind(&config.socket_path)
        .with_context(|| format!("binding socket at {}", config.socket_path.display()))?;

    for stream in listener.incoming() {
        let stream = stream.context("accepting connection")?;
        if let Err(e) = handle_connection(stream, &catalog, &config) {
            eprintln!("connection ended with error: {e:#}");
        }
    }

    Ok(())
}

fn handle_connection(stream: UnixStream, catalog: &Arc<Mutex<Catalog>>, config: &ServerConfig) -> anyhow::Result<()> {
    let mut writer = stream.try_clone().context("cloning connection for writes")?;
    let reader = BufReader::new(stream);
    let mut session = SessionContext::new();

    for line in reader.lines() {
        let line = line.context("reading query line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "shutdown" {
            catalog.lock().shutdown().context("flushing catalog on shutdown")?;
            break;
        }

        let reply = match parser::parse_line(line) {
            Ok(op) => dispatch_locked(op, catalog, &mut session, config),
            Err(e) => Reply::Error(e),
        };
        write_reply(&mut writer, &reply)?;
    }

    Ok(())
}

fn dispatch_locked(op: Operator, catalog: &Arc<Mutex<Catalog>>, session: &mut SessionContext, config: &ServerConfig) -> Reply {
    let mut catalog = catalog.lock();
    dispatcher::dispatch(op, &mut catalog, session, config.multithread_threshold, config.btree_fanout)
}

fn write_reply(out: &mut UnixStream, reply: &Reply) -> anyhow::Result<()> {
    match reply {
        Reply::Done => writeln!(out, "OK")?,
        Reply::Csv(csv) => writeln!(out, "{csv}")?,
        Reply::Error(e) => writeln!(out, "ERROR {e}")?,
    }
    Ok(())
}
