//! Result types for simplification operations.

// Triangle counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]

use mesh_types::IndexedMesh;

/// Result of mesh simplification.
#[derive(Debug, Clone)]
pub struct DecimationResult {
    /// The simplified mesh.
    pub mesh: IndexedMesh,

    /// Number of triangles in the original mesh.
    pub original_triangles: usize,

    /// Number of triangles in the simplified mesh.
    pub final_triangles: usize,

    /// Number of edge collapses performed.
    pub collapses_performed: usize,

    /// Number of edge collapses rejected as illegal.
    pub collapses_rejected: usize,
}

impl DecimationResult {
    /// The reduction ratio (final / original).
    #[must_use]
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_triangles == 0 {
            1.0
        } else {
            self.final_triangles as f64 / self.original_triangles as f64
        }
    }

    /// The percentage of triangles removed.
    #[must_use]
    pub fn reduction_percent(&self) -> f64 {
        (1.0 - self.reduction_ratio()) * 100.0
    }

    /// Whether any simplification occurred.
    #[must_use]
    pub const fn was_simplified(&self) -> bool {
        self.collapses_performed > 0
    }
}

impl std::fmt::Display for DecimationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Simplification: {} → {} triangles ({:.1}% reduction, {} collapses, {} rejected)",
            self.original_triangles,
            self.final_triangles,
            self.reduction_percent(),
            self.collapses_performed,
            self.collapses_rejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_ratio() {
        let result = DecimationResult {
            mesh: IndexedMesh::new(),
            original_triangles: 1000,
            final_triangles: 500,
            collapses_performed: 250,
            collapses_rejected: 10,
        };

        assert!((result.reduction_ratio() - 0.5).abs() < 0.001);
        assert!((result.reduction_percent() - 50.0).abs() < 0.1);
        assert!(result.was_simplified());
    }

    #[test]
    fn test_empty_input_ratio() {
        let result = DecimationResult {
            mesh: IndexedMesh::new(),
            original_triangles: 0,
            final_triangles: 0,
            collapses_performed: 0,
            collapses_rejected: 0,
        };
        assert!((result.reduction_ratio() - 1.0).abs() < 0.001);
        assert!(!result.was_simplified());
    }

    #[test]
    fn test_display() {
        let result = DecimationResult {
            mesh: IndexedMesh::new(),
            original_triangles: 1000,
            final_triangles: 500,
            collapses_performed: 250,
            collapses_rejected: 10,
        };

        let display = format!("{result}");
        assert!(display.contains("1000"));
        assert!(display.contains("500"));
        assert!(display.contains("50.0%"));
    }
}
