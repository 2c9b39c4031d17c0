//! Error types for fingerprinting and indexing.

use thiserror::Error;

/// Errors that can occur while building, comparing or indexing fingerprints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimhashError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Fingerprint width mismatch: expected {expected} bits, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Cannot construct fingerprint: {0}")]
    Construction(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SimhashError {
    /// Check if this error was caused by a bad argument (including width mismatches).
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::WidthMismatch { .. })
    }

    /// Check if this error came from the storage backend.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type for simhash operations.
pub type Result<T> = std::result::Result<T, SimhashError>;
