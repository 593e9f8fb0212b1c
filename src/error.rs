//! Crate-wide error type.
//!
//! Operators never panic on caller-reachable failures; they return
//! [`EngineError`], which the dispatcher turns into a status code on the
//! wire (see [`crate::wire`]) instead of tearing down the session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("incorrect format: {0}")]
    IncorrectFormat(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
