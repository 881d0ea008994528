//! Indexed triangle mesh.

use crate::{Aabb, MeshBounds, MeshTopology, Vertex};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle surface mesh with indexed vertices.
///
/// Faces store `u32` indices into the vertex array, counter-clockwise when
/// viewed from outside the surface.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, MeshTopology, Vertex};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex array.
    pub vertices: Vec<Vertex>,
    /// Triangular faces as indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create an empty mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    /// The bounding box of face `index`, or `None` if out of range.
    #[must_use]
    pub fn triangle_bounds(&self, index: usize) -> Option<Aabb> {
        self.triangle(index).map(|t| t.bounds())
    }

    /// Remove all vertices and faces.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
    }
}

impl MeshTopology for IndexedMesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    fn face(&self, index: usize) -> Option<&[u32; 3]> {
        self.faces.get(index)
    }

    fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    fn faces(&self) -> impl Iterator<Item = &[u32; 3]> {
        self.faces.iter()
    }
}

impl MeshBounds for IndexedMesh {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shapes::unit_cube;
    use nalgebra::Point3;

    #[test]
    fn test_empty_mesh() {
        let mesh = IndexedMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.bounds_opt().is_none());
    }

    #[test]
    fn test_cube_topology() {
        let cube = unit_cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 12);
        assert_eq!(cube.triangles().count(), 12);
    }

    #[test]
    fn test_cube_bounds() {
        let bounds = unit_cube().bounds();
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_triangle_resolves_positions() {
        let cube = unit_cube();
        let tri = cube.triangle(0).unwrap();
        assert!(tri.area() > 0.0);
    }

    #[test]
    fn test_triangle_out_of_range() {
        let cube = unit_cube();
        assert!(cube.triangle(12).is_none());
        assert!(cube.triangle_bounds(12).is_none());
    }
}
