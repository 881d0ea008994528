//! Volumetric tetrahedral mesh container.

use crate::{Aabb, Tetrahedron, Vertex};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pairs of local vertex indices forming the six edges of a tetrahedron.
pub const TET_EDGES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// A volumetric mesh of tetrahedral elements over a shared vertex array.
///
/// Elements are stored positively oriented (non-negative signed volume).
///
/// # Example
///
/// ```
/// use mesh_types::{TetMesh, Tetrahedron, Vertex};
///
/// let mut mesh = TetMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0));
/// mesh.tetrahedra.push(Tetrahedron::new(0, 1, 2, 3));
///
/// assert!((mesh.total_volume() - 1.0 / 6.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TetMesh {
    /// Vertex array.
    pub vertices: Vec<Vertex>,
    /// Tetrahedral elements as indices into `vertices`.
    pub tetrahedra: Vec<Tetrahedron>,
}

impl TetMesh {
    /// Create an empty tetrahedral mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            tetrahedra: Vec::new(),
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of tetrahedral elements.
    #[must_use]
    pub fn tet_count(&self) -> usize {
        self.tetrahedra.len()
    }

    /// Whether the mesh has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tetrahedra.is_empty()
    }

    /// The four corner positions of element `index`, or `None` if the element
    /// or any of its vertex indices is out of range.
    #[must_use]
    pub fn tet_points(&self, index: usize) -> Option<[Point3<f64>; 4]> {
        let tet = self.tetrahedra.get(index)?;
        let mut points = [Point3::origin(); 4];
        for (slot, &v) in points.iter_mut().zip(&tet.vertices) {
            *slot = self.vertices.get(v as usize)?.position;
        }
        Some(points)
    }

    /// Signed volume of element `index`.
    ///
    /// Returns `None` for an out-of-range element.
    #[must_use]
    pub fn tet_volume(&self, index: usize) -> Option<f64> {
        let [p0, p1, p2, p3] = self.tet_points(index)?;
        Some(Tetrahedron::signed_volume(&p0, &p1, &p2, &p3))
    }

    /// Longest edge length of element `index`.
    #[must_use]
    pub fn tet_longest_edge(&self, index: usize) -> Option<f64> {
        let points = self.tet_points(index)?;
        let mut longest = 0.0_f64;
        for [a, b] in TET_EDGES {
            longest = longest.max((points[a] - points[b]).norm());
        }
        Some(longest)
    }

    /// Shape quality of element `index`: `6 * sqrt(2) * |V| / e^3` where `e`
    /// is the longest edge.
    ///
    /// A regular tetrahedron scores 1.0; degenerate slivers approach 0.0.
    #[must_use]
    pub fn tet_quality(&self, index: usize) -> Option<f64> {
        let volume = self.tet_volume(index)?.abs();
        let edge = self.tet_longest_edge(index)?;
        if edge <= 0.0 {
            return Some(0.0);
        }
        Some(6.0 * std::f64::consts::SQRT_2 * volume / (edge * edge * edge))
    }

    /// Sum of signed volumes over all elements.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        (0..self.tet_count()).filter_map(|i| self.tet_volume(i)).sum()
    }

    /// The bounding box of all vertices (empty box for no vertices).
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Drop vertices not referenced by any element and remap element indices.
    ///
    /// Element order is preserved; surviving vertices keep their relative
    /// order.
    pub fn compact_vertices(&mut self) {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut kept = Vec::new();
        for tet in &self.tetrahedra {
            for &v in &tet.vertices {
                let slot = &mut remap[v as usize];
                if *slot == u32::MAX {
                    *slot = u32::try_from(kept.len()).unwrap_or(u32::MAX);
                    kept.push(self.vertices[v as usize]);
                }
            }
        }
        for tet in &mut self.tetrahedra {
            for v in &mut tet.vertices {
                *v = remap[*v as usize];
            }
        }
        self.vertices = kept;
    }
}

/// A barycentric link from an external point to a tetrahedral element.
///
/// Produced when embedding a surface mesh in a volumetric mesh: each surface
/// vertex records the element containing (or closest to) it and its
/// barycentric coordinates within that element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexLink {
    /// Index of the linked element.
    pub tetrahedron: u32,
    /// Barycentric coordinates within the linked element (sum to 1).
    pub barycentric: [f64; 4],
}

impl VertexLink {
    /// Create a link from an element index and barycentric coordinates.
    #[must_use]
    pub const fn new(tetrahedron: u32, barycentric: [f64; 4]) -> Self {
        Self {
            tetrahedron,
            barycentric,
        }
    }

    /// Reconstruct the linked world-space position from the current element
    /// corner positions.
    #[must_use]
    pub fn resolve(&self, corners: &[Point3<f64>; 4]) -> Point3<f64> {
        let mut p = Point3::origin();
        for (w, c) in self.barycentric.iter().zip(corners) {
            p.coords += *w * c.coords;
        }
        p
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tet() -> TetMesh {
        let mut mesh = TetMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0));
        mesh.tetrahedra.push(Tetrahedron::new(0, 1, 2, 3));
        mesh
    }

    #[test]
    fn test_volume() {
        let mesh = unit_tet();
        assert_relative_eq!(mesh.tet_volume(0).unwrap(), 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.total_volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_longest_edge() {
        let mesh = unit_tet();
        assert_relative_eq!(
            mesh.tet_longest_edge(0).unwrap(),
            2.0_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_regular_tet_quality_is_one() {
        let mut mesh = TetMesh::new();
        // Regular tetrahedron with edge length sqrt(2).
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 1.0));
        mesh.vertices.push(Vertex::from_coords(1.0, -1.0, -1.0));
        mesh.vertices.push(Vertex::from_coords(-1.0, 1.0, -1.0));
        mesh.vertices.push(Vertex::from_coords(-1.0, -1.0, 1.0));
        mesh.tetrahedra.push(Tetrahedron::new(0, 1, 2, 3));
        assert_relative_eq!(mesh.tet_quality(0).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sliver_quality_near_zero() {
        let mut mesh = unit_tet();
        mesh.vertices[3] = Vertex::from_coords(0.0, 0.0, 1e-9);
        assert!(mesh.tet_quality(0).unwrap() < 1e-6);
    }

    #[test]
    fn test_compact_vertices() {
        let mut mesh = unit_tet();
        // Unreferenced vertex in the middle of the array.
        mesh.vertices.insert(2, Vertex::from_coords(99.0, 99.0, 99.0));
        mesh.tetrahedra[0] = Tetrahedron::new(0, 1, 3, 4);

        mesh.compact_vertices();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.tetrahedra[0].vertices, [0, 1, 2, 3]);
        assert_relative_eq!(mesh.tet_volume(0).unwrap(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertex_link_resolve() {
        let link = VertexLink::new(0, [0.25, 0.25, 0.25, 0.25]);
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let p = link.resolve(&corners);
        assert_relative_eq!(p.x, 0.25, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.25, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.25, epsilon = 1e-12);
    }
}
