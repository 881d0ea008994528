//! Error types for tetrahedralization.

use thiserror::Error;

/// Errors that can occur during tetrahedralization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TetraError {
    /// The operation was cancelled through its [`mesh_types::ProgressContext`].
    ///
    /// All partially-built output has been discarded.
    #[error("tetrahedralization cancelled")]
    Cancelled,

    /// The subdivision parameter must be at least 1.
    #[error("subdivision must be at least 1, got {0}")]
    InvalidSubdivision(u32),

    /// A spatial hash could not be built over the working volume.
    #[error(transparent)]
    Spatial(#[from] mesh_spatial::SpatialError),

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

/// Result type for tetrahedralization operations.
pub type TetraResult<T> = std::result::Result<T, TetraError>;
