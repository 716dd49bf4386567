//! Transport error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("datagram too large: {size} bytes exceeds max {max}")]
    DatagramTooLarge { size: usize, max: usize },

    #[error("timed out after {attempts} attempt(s), last timeout {last_timeout_ms}ms")]
    RetriesExhausted {
        attempts: u32,
        last_timeout_ms: u64,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;
