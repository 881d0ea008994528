//! Parameters for isosurface stuffing.

/// How lattice densities and edge cuts are derived from the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DensitySource {
    /// Splat every triangle's point-distance field onto nearby lattice
    /// samples within a thickness band and subtract the iso threshold.
    ///
    /// Robust on coarse grids, but meshes a thickened band around the
    /// surface rather than the enclosed solid.
    #[default]
    Field,

    /// Cast a ray along every lattice edge against the (hashed) triangles
    /// and classify inside/outside by crossing parity along the axes.
    ///
    /// The output boundary stays close to the surface; detailed meshes need
    /// a fine grid to resolve.
    Geometry,
}

/// Parameters for isosurface stuffing.
#[derive(Debug, Clone)]
pub struct StuffParams {
    /// Subdivision count: the lattice cell size is
    /// `boundingDiagonal / subdivision`. Default: 10
    pub subdivision: u32,

    /// Density sourcing strategy. Default: [`DensitySource::Field`]
    pub source: DensitySource,
}

impl Default for StuffParams {
    fn default() -> Self {
        Self {
            subdivision: 10,
            source: DensitySource::Field,
        }
    }
}

impl StuffParams {
    /// Create params with a specific subdivision count.
    #[must_use]
    pub fn with_subdivision(subdivision: u32) -> Self {
        Self {
            subdivision,
            ..Default::default()
        }
    }

    /// Select the density sourcing strategy.
    #[must_use]
    pub const fn with_source(mut self, source: DensitySource) -> Self {
        self.source = source;
        self
    }
}
