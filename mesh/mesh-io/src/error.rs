//! Error types for mesh I/O operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur during mesh I/O operations.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Invalid file content (parse error).
    #[error("invalid file content on line {line}: {message}")]
    InvalidContent {
        /// 1-based line number of the offending record.
        line: usize,
        /// Description of what was invalid.
        message: String,
    },

    /// A record references a vertex index outside the vertex list.
    #[error("line {line}: tetrahedron references vertex {vertex} but only {vertex_count} vertices were declared")]
    VertexOutOfRange {
        /// 1-based line number of the offending record.
        line: usize,
        /// Out-of-range vertex index.
        vertex: u32,
        /// Number of vertices declared before this record.
        vertex_count: usize,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    /// Create an `InvalidContent` error for the given line.
    #[must_use]
    pub fn invalid_content(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            line,
            message: message.into(),
        }
    }
}
