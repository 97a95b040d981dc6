//! Error types for strata
//!
//! Provides a unified error type for all store operations. The index
//! (Arena / SkipList) never fails and does not appear here.

use std::fmt;

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Platform operation that produced a passthrough failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Open,
    Create,
    Truncate,
    Metadata,
    Map,
    Flush,
    Read,
    Write,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::Open => "open",
            StoreOp::Create => "create",
            StoreOp::Truncate => "truncate",
            StoreOp::Metadata => "metadata",
            StoreOp::Map => "map",
            StoreOp::Flush => "flush",
            StoreOp::Read => "read",
            StoreOp::Write => "write",
        };
        f.write_str(name)
    }
}

/// Unified error type for strata operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // Store Request Errors
    // -------------------------------------------------------------------------
    #[error("Buffer must not be empty")]
    ZeroLengthBuffer,

    #[error("Read of {len} bytes at offset {offset} extends past high-water mark {high_water_mark}")]
    ReadOutOfRange {
        offset: u64,
        len: usize,
        high_water_mark: u64,
    },

    #[error("Store size limit reached: {required} bytes required, ceiling is {max_size}")]
    SizeLimitExceeded { required: u64, max_size: u64 },

    #[error("Short transfer: expected {expected} bytes, moved {actual}")]
    ShortTransfer { expected: usize, actual: usize },

    #[error("Access ending at {end} lies outside the mapped extent of {mapped} bytes")]
    OutsideMapping { end: u64, mapped: u64 },

    #[error("Store is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Flush Errors
    // -------------------------------------------------------------------------
    #[error("{op} would block")]
    WouldBlock { op: StoreOp },

    #[error("Invalid range: {len} bytes at offset {offset}")]
    InvalidRange { offset: u64, len: u64 },

    #[error("No such range: {len} bytes at offset {offset}")]
    NoSuchRange { offset: u64, len: u64 },

    // -------------------------------------------------------------------------
    // Platform Errors
    // -------------------------------------------------------------------------
    #[error("{op} failed: {source}")]
    Platform {
        op: StoreOp,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Data Errors
    // -------------------------------------------------------------------------
    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrataError {
    /// Wrap a platform failure with the operation that produced it
    pub fn platform(op: StoreOp, source: std::io::Error) -> Self {
        StrataError::Platform { op, source }
    }
}
