//! Error types for stashmux
//!
//! Provides a unified error type for all multiplexer operations.

use std::io;

use thiserror::Error;

/// Result type alias using MuxError
pub type Result<T> = std::result::Result<T, MuxError>;

/// Unified error type for stashmux operations
#[derive(Debug, Error)]
pub enum MuxError {
    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    #[error("Access out of bounds: {offset} + {length} > {total}")]
    OutOfBounds { offset: u64, length: u64, total: u64 },

    #[error("Write length {length} exceeds the {available} bytes supplied")]
    LengthExceedsData { length: u64, available: u64 },

    // -------------------------------------------------------------------------
    // Backing Store Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open store {identifier}: {source}")]
    StoreOpen {
        identifier: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to save store {identifier}: {source}")]
    StoreSave {
        identifier: String,
        #[source]
        source: io::Error,
    },

    #[error("Store access failed on {identifier}: {source}")]
    StoreAccess {
        identifier: String,
        #[source]
        source: io::Error,
    },

    #[error("Store {identifier} changed length: indexed {expected} bytes, opened {actual}")]
    StoreResized {
        identifier: String,
        expected: u64,
        actual: u64,
    },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Worker Errors
    // -------------------------------------------------------------------------
    #[error("Mux worker is no longer running")]
    WorkerStopped,
}

impl MuxError {
    /// Build an `OutOfBounds` error for the given request
    pub(crate) fn out_of_bounds(offset: u64, length: u64, total: u64) -> Self {
        MuxError::OutOfBounds {
            offset,
            length,
            total,
        }
    }

    /// True for errors raised before any backing store was touched
    pub fn is_addressing(&self) -> bool {
        matches!(
            self,
            MuxError::OutOfBounds { .. } | MuxError::LengthExceedsData { .. }
        )
    }
}

/// Render a store identifier for error messages
///
/// Uses the `Debug` form with one layer of surrounding quotes removed, so
/// `"store_1"` reads as `store_1` and a path reads as its plain text.
pub(crate) fn describe_id<I: std::fmt::Debug>(identifier: &I) -> String {
    let text = format!("{identifier:?}");
    let unquoted = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(str::to_owned);
    unquoted.unwrap_or(text)
}
