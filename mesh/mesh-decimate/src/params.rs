//! Parameters for mesh simplification.

/// Parameters for mesh simplification.
#[derive(Debug, Clone)]
pub struct DecimateParams {
    /// Target number of triangles. If `None`, uses `target_ratio` instead.
    pub target_triangles: Option<usize>,

    /// Target ratio of triangles to keep (0.0 to 1.0). Default: 0.5
    pub target_ratio: f64,

    /// Maximum allowed edge length after a collapse. Collapses whose merged
    /// vertex would be farther than this from any surviving neighbor are
    /// rejected. If `None`, no length bound is applied.
    pub max_edge_length: Option<f64>,

    /// Number of sampling intervals along an edge when scoring a collapse
    /// (`cost_samples + 1` candidate positions are evaluated). Default: 10
    pub cost_samples: u32,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_triangles: None,
            target_ratio: 0.5,
            max_edge_length: None,
            cost_samples: 10,
        }
    }
}

impl DecimateParams {
    /// Create params targeting a specific triangle count.
    #[must_use]
    pub fn with_target_triangles(count: usize) -> Self {
        Self {
            target_triangles: Some(count),
            ..Default::default()
        }
    }

    /// Create params targeting a ratio of original triangles.
    #[must_use]
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Set the maximum post-collapse edge length.
    #[must_use]
    pub const fn with_max_edge_length(mut self, length: f64) -> Self {
        self.max_edge_length = Some(length);
        self
    }

    /// Set the number of cost sampling intervals.
    #[must_use]
    pub const fn with_cost_samples(mut self, samples: u32) -> Self {
        self.cost_samples = samples;
        self
    }
}
