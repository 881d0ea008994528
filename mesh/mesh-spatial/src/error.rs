//! Error types for spatial hashing.

/// Errors that can occur when building a spatial hash.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// The grid spacing must be positive and finite.
    #[error("grid spacing must be positive and finite, got {0}")]
    InvalidSpacing(f64),
}
