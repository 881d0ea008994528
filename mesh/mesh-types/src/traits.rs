//! Traits abstracting over mesh representations.

use crate::{Aabb, Triangle, Vertex};

/// Topology access for triangle surface meshes.
///
/// Implemented by [`crate::IndexedMesh`]; algorithms that only need to walk
/// vertices and faces should take `impl MeshTopology` rather than a concrete
/// type.
pub trait MeshTopology {
    /// Number of vertices in the mesh.
    fn vertex_count(&self) -> usize;

    /// Number of triangular faces in the mesh.
    fn face_count(&self) -> usize;

    /// Whether the mesh has no faces.
    fn is_empty(&self) -> bool {
        self.face_count() == 0
    }

    /// Vertex at `index`, or `None` if out of range.
    fn vertex(&self, index: usize) -> Option<&Vertex>;

    /// Face at `index` as three vertex indices, or `None` if out of range.
    fn face(&self, index: usize) -> Option<&[u32; 3]>;

    /// Face at `index` with its vertex positions resolved.
    ///
    /// Returns `None` if the face index is out of range or any of its vertex
    /// indices are.
    fn triangle(&self, index: usize) -> Option<Triangle> {
        let face = self.face(index)?;
        Some(Triangle::new(
            self.vertex(face[0] as usize)?.position,
            self.vertex(face[1] as usize)?.position,
            self.vertex(face[2] as usize)?.position,
        ))
    }

    /// Iterator over all vertices.
    fn vertices(&self) -> impl Iterator<Item = &Vertex>;

    /// Iterator over all faces.
    fn faces(&self) -> impl Iterator<Item = &[u32; 3]>;

    /// Iterator over all faces with vertex positions resolved.
    ///
    /// Faces referencing out-of-range vertices are skipped.
    fn triangles(&self) -> impl Iterator<Item = Triangle> {
        (0..self.face_count()).filter_map(|i| self.triangle(i))
    }
}

/// Bounding-volume access for meshes.
pub trait MeshBounds: MeshTopology {
    /// The axis-aligned bounding box of all vertices.
    ///
    /// Returns an empty [`Aabb`] for a mesh with no vertices.
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices().map(|v| &v.position))
    }

    /// The bounding box, or `None` for a mesh with no vertices.
    fn bounds_opt(&self) -> Option<Aabb> {
        if self.vertex_count() == 0 {
            None
        } else {
            Some(self.bounds())
        }
    }

    /// The center of the bounding box.
    fn center(&self) -> crate::Point3<f64> {
        self.bounds().center()
    }
}
