//! Wire framing: the fixed message header, status codes, and the
//! `ColumnMetadata` + raw-`i32`-array CSV transfer format.
//!
//! This module owns only the framing: turning a [`crate::dispatcher::Reply`]
//! into bytes and back. The actual socket accept loop lives in
//! `bin/server.rs`.

use crate::error::EngineError;
use crate::types::StatusCode;

/// Fixed message header. `length` is the byte length of the payload that
/// follows (zero when the reply carries no payload).
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub status: StatusCode,
    pub length: i32,
}

pub fn status_for_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::ObjectNotFound,
        EngineError::IncorrectFormat(_) => StatusCode::IncorrectFormat,
        EngineError::UnknownCommand(_) => StatusCode::UnknownCommand,
        EngineError::Execution(_) | EngineError::Io(_) => StatusCode::ExecutionError,
    }
}

/// Per-column header inside a `CSV_TRANSFER` payload: a fixed-size name
/// field plus the stats the receiver needs without rescanning the data.
#[derive(Debug, Clone)]
pub struct ColumnMetadata {
    pub name: String,
    pub num_elements: u64,
    pub min: i64,
    pub max: i64,
    pub sum: i64,
}

pub const COLUMN_NAME_FIELD_LEN: usize = 64;

impl ColumnMetadata {
    /// The sentinel row that terminates a CSV transfer: zero elements,
    /// no name.
    pub fn terminator() -> Self {
        ColumnMetadata { name: String::new(), num_elements: 0, min: 0, max: 0, sum: 0 }
    }

    pub fn is_terminator(&self) -> bool {
        self.num_elements == 0
    }
}

/// One column's worth of a CSV transfer: its metadata plus the raw
/// little-endian `i32` values.
#[derive(Debug, Clone)]
pub struct CsvColumnBlock {
    pub metadata: ColumnMetadata,
    pub values: Vec<i32>,
}

impl CsvColumnBlock {
    pub fn terminator_block() -> Self {
        CsvColumnBlock { metadata: ColumnMetadata::terminator(), values: Vec::new() }
    }

    pub fn new(name: String, values: Vec<i32>) -> Self {
        let metadata = ColumnMetadata {
            name,
            num_elements: values.len() as u64,
            min: values.iter().copied().map(i64::from).min().unwrap_or(0),
            max: values.iter().copied().map(i64::from).max().unwrap_or(0),
            sum: values.iter().copied().map(i64::from).sum(),
        };
        CsvColumnBlock { metadata, values }
    }
}
