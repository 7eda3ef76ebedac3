//! Common error types for the recital clients
//!
//! `Error` covers local concerns (configuration, cache file I/O). The remote
//! side has its own taxonomy: `FetchError` for network/HTTP failures,
//! `ParseError` for malformed payloads and `MutationError` for rejected or
//! failed writes.

use thiserror::Error;

/// Common result type for local operations
pub type Result<T> = std::result::Result<T, Error>;

/// Local error types (configuration, cache persistence)
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error for locally persisted state
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Network or HTTP failure while reading remote state
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed tabular or JSON payload
///
/// Never raised for an unbalanced quote in a CSV line; that case is tolerated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Payload is not valid UTF-8")]
    Encoding,

    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("Unexpected payload shape: {0}")]
    UnexpectedShape(String),
}

/// Failure of a full load (fetch then parse)
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Write rejected or failed
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request rejected with HTTP {0}")]
    Rejected(u16),

    #[error("Unknown performer: {0}")]
    UnknownPerformer(String),

    #[error("No program item at position {0}")]
    UnknownPosition(usize),
}
