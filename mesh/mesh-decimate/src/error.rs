//! Error types for mesh simplification.

use thiserror::Error;

/// Errors that can occur during simplification.
///
/// Heap exhaustion (no further legal collapse) is not an error: it is the
/// expected terminal state, reported by `simplification_step` returning
/// `false`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecimateError {
    /// A face references a vertex index outside the vertex array.
    #[error("face {face} references vertex {vertex} but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        /// Offending face index.
        face: usize,
        /// Out-of-range vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}

/// Result type for simplification operations.
pub type DecimateResult<T> = std::result::Result<T, DecimateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DecimateError::FaceIndexOutOfRange {
            face: 3,
            vertex: 17,
            vertex_count: 10,
        };
        let text = format!("{err}");
        assert!(text.contains("face 3"));
        assert!(text.contains("17"));
    }
}
