//! Error types for the Xiphos library.
//!
//! This module provides comprehensive error handling for all Xiphos operations.
//! All errors are represented by the [`XiphosError`] enum, which provides
//! detailed information about what went wrong.
//!
//! # Examples
//!
//! ```
//! use xiphos::error::{Result, XiphosError};
//!
//! fn example_operation() -> Result<()> {
//!     // Return an error
//!     Err(XiphosError::malformed_query("query contains no tokens"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Xiphos operations.
///
/// This enum represents all possible errors that can occur in the Xiphos
/// library. It uses the `thiserror` crate for automatic `Error` trait
/// implementation and provides convenient constructor methods for creating
/// specific error types.
#[derive(Error, Debug)]
pub enum XiphosError {
    /// I/O errors (file operations, unreadable stores, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A postings list that cannot be decoded (truncated varint, fewer
    /// postings than the document frequency implies, non-increasing
    /// document IDs).
    #[error("Corrupt postings: {0}")]
    CorruptPostings(String),

    /// A query whose token sequence does not reduce to a single result set.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// An AND/OR operator encountered with fewer than two operand sets.
    #[error("Stack underflow: {0}")]
    StackUnderflow(String),

    /// A collection store in a non-seekable format.
    #[error("Unsupported collection: {0}")]
    UnsupportedCollection(String),

    /// A document fetch offset beyond the end of the collection store.
    #[error("Offset out of range: {0}")]
    OffsetOutOfRange(String),

    /// Index-related errors (shard discovery, header validation,
    /// shard-count consistency).
    #[error("Index error: {0}")]
    Index(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with XiphosError.
pub type Result<T> = std::result::Result<T, XiphosError>;

impl XiphosError {
    /// Create a new corrupt-postings error.
    pub fn corrupt_postings<S: Into<String>>(msg: S) -> Self {
        XiphosError::CorruptPostings(msg.into())
    }

    /// Create a new malformed-query error.
    pub fn malformed_query<S: Into<String>>(msg: S) -> Self {
        XiphosError::MalformedQuery(msg.into())
    }

    /// Create a new stack-underflow error.
    pub fn stack_underflow<S: Into<String>>(msg: S) -> Self {
        XiphosError::StackUnderflow(msg.into())
    }

    /// Create a new unsupported-collection error.
    pub fn unsupported_collection<S: Into<String>>(msg: S) -> Self {
        XiphosError::UnsupportedCollection(msg.into())
    }

    /// Create a new offset-out-of-range error.
    pub fn offset_out_of_range(offset: u64, size: u64) -> Self {
        XiphosError::OffsetOutOfRange(format!(
            "offset {offset} beyond end of collection store ({size} bytes)"
        ))
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        XiphosError::Index(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        XiphosError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        XiphosError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = XiphosError::index("Test index error");
        assert_eq!(error.to_string(), "Index error: Test index error");

        let error = XiphosError::corrupt_postings("truncated varint");
        assert_eq!(error.to_string(), "Corrupt postings: truncated varint");

        let error = XiphosError::stack_underflow("AND requires two operands");
        assert_eq!(
            error.to_string(),
            "Stack underflow: AND requires two operands"
        );
    }

    #[test]
    fn test_offset_out_of_range_message() {
        let error = XiphosError::offset_out_of_range(100, 42);
        assert_eq!(
            error.to_string(),
            "Offset out of range: offset 100 beyond end of collection store (42 bytes)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let xiphos_error = XiphosError::from(io_error);

        match xiphos_error {
            XiphosError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
