//! Fatal host errors.
//!
//! Anything in here ends the dispatch loop. Recoverable failures (unknown
//! procedure, handler errors) never surface as a `HostError`; they are
//! answered with an error envelope instead.

use std::io;

use linerpc_protocol::{DecodeError, EncodeError};

/// Errors that terminate the dispatch loop.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed request on line {line}: {source}")]
    Decode {
        line: u64,
        #[source]
        source: DecodeError,
    },

    #[error("procedure '{procedure}' returned a value with no JSON representation: {source}")]
    Unrepresentable {
        procedure: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
