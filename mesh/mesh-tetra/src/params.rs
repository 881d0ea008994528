//! Parameters for tetrahedralization.

/// Parameters for tetrahedralization.
#[derive(Debug, Clone)]
pub struct TetraParams {
    /// Subdivision count: the interior point lattice spacing is
    /// `2 * boundingDiagonal / subdivision`. Default: 10
    pub subdivision: u32,

    /// Whether to synthesize relaxed interior points in addition to the
    /// surface vertices. Default: true
    pub interior_points: bool,

    /// Number of relaxation iterations for interior points. Default: 5
    pub relax_iterations: u32,

    /// Seed for the deterministic vertex jitter applied before insertion.
    /// Runs with the same seed produce the same mesh. Default: 0
    pub seed: u64,
}

impl Default for TetraParams {
    fn default() -> Self {
        Self {
            subdivision: 10,
            interior_points: true,
            relax_iterations: 5,
            seed: 0,
        }
    }
}

impl TetraParams {
    /// Create params with a specific subdivision count.
    #[must_use]
    pub fn with_subdivision(subdivision: u32) -> Self {
        Self {
            subdivision,
            ..Default::default()
        }
    }

    /// Disable or enable interior point synthesis.
    #[must_use]
    pub const fn with_interior_points(mut self, enabled: bool) -> Self {
        self.interior_points = enabled;
        self
    }

    /// Set the jitter seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = TetraParams::default();
        assert_eq!(params.subdivision, 10);
        assert!(params.interior_points);
        assert_eq!(params.relax_iterations, 5);
    }

    #[test]
    fn test_builder() {
        let params = TetraParams::with_subdivision(6)
            .with_interior_points(false)
            .with_seed(42);
        assert_eq!(params.subdivision, 6);
        assert!(!params.interior_points);
        assert_eq!(params.seed, 42);
    }
}
