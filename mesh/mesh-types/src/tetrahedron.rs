//! Tetrahedral element and face key.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A tetrahedron as four indices into a vertex array.
///
/// The vertex order encodes orientation: a tetrahedron is stored so that its
/// signed volume is non-negative, i.e. vertex 3 lies on the positive side of
/// the plane through vertices 0, 1, 2 (counter-clockwise from outside).
///
/// Equality and hashing go through [`Tetrahedron::canonical`], so two
/// tetrahedra over the same four vertices compare equal exactly when they
/// have the same orientation, regardless of vertex order.
///
/// # Example
///
/// ```
/// use mesh_types::Tetrahedron;
///
/// let tet = Tetrahedron::new(3, 1, 2, 0);
/// assert!(tet.contains_vertex(0));
/// assert!(!tet.contains_vertex(4));
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tetrahedron {
    /// Vertex indices.
    pub vertices: [u32; 4],
}

impl PartialEq for Tetrahedron {
    fn eq(&self, other: &Self) -> bool {
        self.canonical().vertices == other.canonical().vertices
    }
}

impl Eq for Tetrahedron {}

impl std::hash::Hash for Tetrahedron {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical().vertices.hash(state);
    }
}

impl Tetrahedron {
    /// Create a tetrahedron from four vertex indices.
    #[inline]
    #[must_use]
    pub const fn new(v0: u32, v1: u32, v2: u32, v3: u32) -> Self {
        Self {
            vertices: [v0, v1, v2, v3],
        }
    }

    /// Whether `vertex` is one of the four corners.
    #[must_use]
    pub fn contains_vertex(&self, vertex: u32) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Replace every occurrence of `old` with `new`.
    ///
    /// Returns `true` if a replacement happened.
    pub fn replace_vertex(&mut self, old: u32, new: u32) -> bool {
        let mut replaced = false;
        for v in &mut self.vertices {
            if *v == old {
                *v = new;
                replaced = true;
            }
        }
        replaced
    }

    /// The four boundary faces, wound so their normals point out of the
    /// tetrahedron (for a positively oriented element).
    #[must_use]
    pub fn faces(&self) -> [TetraFace; 4] {
        let [v0, v1, v2, v3] = self.vertices;
        [
            TetraFace::new(v2, v1, v0),
            TetraFace::new(v0, v1, v3),
            TetraFace::new(v1, v2, v3),
            TetraFace::new(v2, v0, v3),
        ]
    }

    /// The canonical even-permutation form: same orientation, unique vertex
    /// order.
    ///
    /// The smallest index is rotated to slot 0 and the smallest of the
    /// remaining three to slot 1, using only even permutations so the signed
    /// volume is unchanged. Two tetrahedra over the same four vertices
    /// canonicalize to the same form exactly when they have the same
    /// orientation.
    #[must_use]
    pub fn canonical(&self) -> Self {
        let v = self.vertices;

        // Bring the minimum to slot 0 with a double transposition.
        let min_pos = (0..4).fold(0, |best, i| if v[i] < v[best] { i } else { best });
        let mut w = match min_pos {
            0 => v,
            1 => [v[1], v[0], v[3], v[2]],
            2 => [v[2], v[3], v[0], v[1]],
            _ => [v[3], v[2], v[1], v[0]],
        };

        // Cycle the last three (an even permutation) until the smallest of
        // them sits in slot 1.
        while w[1] > w[2] || w[1] > w[3] {
            w = [w[0], w[2], w[3], w[1]];
        }

        Self { vertices: w }
    }

    /// Signed volume of the tetrahedron spanned by four points.
    ///
    /// Positive when `p3` lies on the positive side of the plane through
    /// `p0`, `p1`, `p2` (counter-clockwise).
    #[must_use]
    pub fn signed_volume(
        p0: &Point3<f64>,
        p1: &Point3<f64>,
        p2: &Point3<f64>,
        p3: &Point3<f64>,
    ) -> f64 {
        (p1 - p0).cross(&(p2 - p0)).dot(&(p3 - p0)) / 6.0
    }
}

/// A triangular face of a tetrahedron, used as a hash key during
/// tetrahedralization.
///
/// The stored winding is preserved, but equality and hashing ignore it: two
/// faces over the same three vertices compare equal regardless of order. This
/// lets opposite-wound copies of a shared face cancel each other in a map.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TetraFace {
    /// Vertex indices in their original winding.
    pub vertices: [u32; 3],
}

impl TetraFace {
    /// Create a face, keeping the given winding.
    #[inline]
    #[must_use]
    pub const fn new(v0: u32, v1: u32, v2: u32) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// The vertex indices sorted ascending (the identity used by `Eq` and
    /// `Hash`).
    #[must_use]
    pub fn sorted(&self) -> [u32; 3] {
        let mut s = self.vertices;
        s.sort_unstable();
        s
    }

    /// The face with reversed winding over the same vertices.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        let [v0, v1, v2] = self.vertices;
        Self {
            vertices: [v2, v1, v0],
        }
    }
}

impl PartialEq for TetraFace {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl Eq for TetraFace {}

impl std::hash::Hash for TetraFace {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.sorted().hash(state);
    }
}
