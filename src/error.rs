//! Error types for spanlist
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SpanListError
pub type Result<T> = std::result::Result<T, SpanListError>;

/// Unified error type for spanlist operations
#[derive(Debug, Error)]
pub enum SpanListError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Allocator Errors
    // -------------------------------------------------------------------------
    #[error("No size class serves {requested} bytes (largest unit is {max} bytes)")]
    SizeClass { requested: usize, max: usize },

    #[error("Record encodes to {actual} bytes, node size is {expected} bytes")]
    RecordSize { expected: usize, actual: usize },

    // -------------------------------------------------------------------------
    // Skip List Errors
    // -------------------------------------------------------------------------
    #[error("Invalid position: {0}")]
    InvalidPosition(&'static str),

    #[error("Structural invariant violated: {0}")]
    Invariant(String),

    // -------------------------------------------------------------------------
    // Driver Errors
    // -------------------------------------------------------------------------
    #[error("Command error: {0}")]
    Command(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for SpanListError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) => SpanListError::Io(io),
            other => SpanListError::Serialization(other.to_string()),
        }
    }
}
