//! Interactive single-element editing with undo.

use mesh_types::query::{
    closest_point_on_triangle, point_in_tetrahedron, point_segment_distance_squared,
};
use mesh_types::{Point3, TetMesh, Tetrahedron};

/// One editing operation, recorded for [`TetraEditor::undo`].
#[derive(Debug, Clone)]
enum EditOp {
    Added(Tetrahedron),
    Deleted(Tetrahedron),
}

/// Interactive editor over a tetrahedral mesh.
///
/// Supports deleting single elements and growing a new element off an
/// existing element's face, with an undo log replayed in reverse:
///
/// ```
/// use mesh_tetra::TetraEditor;
/// use mesh_types::{TetMesh, Tetrahedron, Vertex};
///
/// let mut mesh = TetMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0));
/// mesh.tetrahedra.push(Tetrahedron::new(0, 1, 2, 3));
///
/// let mut editor = TetraEditor::new(&mut mesh);
/// assert!(editor.delete_tetrahedron(0));
/// assert!(editor.undo());
/// assert_eq!(mesh.tet_count(), 1);
/// ```
#[derive(Debug)]
pub struct TetraEditor<'a> {
    mesh: &'a mut TetMesh,
    undos: Vec<EditOp>,
}

impl<'a> TetraEditor<'a> {
    /// Start editing `mesh`. The undo log is scoped to this editor.
    pub fn new(mesh: &'a mut TetMesh) -> Self {
        Self {
            mesh,
            undos: Vec::new(),
        }
    }

    /// The element containing `point`, if any. Intended for picking.
    #[must_use]
    pub fn tetra_at(&self, point: &Point3<f64>) -> Option<usize> {
        (0..self.mesh.tet_count()).find(|&index| {
            self.mesh
                .tet_points(index)
                .is_some_and(|corners| point_in_tetrahedron(point, &corners, 1e-9))
        })
    }

    /// Delete the element at `index`. Returns `false` if out of range.
    pub fn delete_tetrahedron(&mut self, index: usize) -> bool {
        if index >= self.mesh.tet_count() {
            return false;
        }
        let tetra = self.mesh.tetrahedra.swap_remove(index);
        self.undos.push(EditOp::Deleted(tetra));
        true
    }

    /// Grow a new element off the side of the element at `index` closest to
    /// the picked `position`.
    ///
    /// The new element spans the picked face and the one unpaired vertex
    /// adjacent to the face edge nearest the pick; the three face edges are
    /// tried in rotation until one yields a positively-oriented element.
    /// Returns `false` when no edge does.
    pub fn add_tetrahedron(&mut self, index: usize, position: &Point3<f64>) -> bool {
        let Some(side) = self.closest_side(index, position) else {
            return false;
        };
        let [p0, p1, p2] = side.map(|v| self.mesh.vertices[v as usize].position);

        let mut edge = 0;
        let mut dmin = point_segment_distance_squared(*position, p0, p1);
        let d = point_segment_distance_squared(*position, p1, p2);
        if d < dmin {
            dmin = d;
            edge = 1;
        }
        if point_segment_distance_squared(*position, p2, p0) < dmin {
            edge = 2;
        }

        for attempt in 0..3 {
            if self.try_add(index, side, (edge + attempt) % 3) {
                return true;
            }
        }
        false
    }

    /// Undo the most recent operation. Returns `false` on an empty log.
    pub fn undo(&mut self) -> bool {
        match self.undos.pop() {
            Some(EditOp::Deleted(tetra)) => {
                self.mesh.tetrahedra.push(tetra);
                true
            }
            Some(EditOp::Added(tetra)) => {
                if let Some(pos) = self.mesh.tetrahedra.iter().position(|t| *t == tetra) {
                    self.mesh.tetrahedra.swap_remove(pos);
                }
                true
            }
            None => false,
        }
    }

    /// The face of element `index` closest to `position`, in stored
    /// (outward) winding.
    fn closest_side(&self, index: usize, position: &Point3<f64>) -> Option<[u32; 3]> {
        let tetra = self.mesh.tetrahedra.get(index)?;
        let mut best: Option<(f64, [u32; 3])> = None;
        for face in tetra.faces() {
            let [p0, p1, p2] = face.vertices.map(|v| self.mesh.vertices[v as usize].position);
            let closest = closest_point_on_triangle(*position, p0, p1, p2);
            let d2 = (position - closest).norm_squared();
            if best.is_none_or(|(b, _)| d2 < b) {
                best = Some((d2, face.vertices));
            }
        }
        best.map(|(_, vertices)| vertices)
    }

    fn try_add(&mut self, index: usize, side: [u32; 3], edge: usize) -> bool {
        let (e0, e1) = match edge {
            0 => (side[0], side[1]),
            1 => (side[1], side[2]),
            _ => (side[2], side[0]),
        };

        // Unpaired vertices around the edge: every element on the edge
        // contributes its two non-edge vertices; vertices shared by two such
        // elements cancel, leaving the fan's two open ends.
        let mut adjacent: Vec<u32> = Vec::new();
        for t in &self.mesh.tetrahedra {
            if !t.contains_vertex(e0) || !t.contains_vertex(e1) {
                continue;
            }
            for v in t.vertices {
                if v == e0 || v == e1 {
                    continue;
                }
                if let Some(pos) = adjacent.iter().position(|&a| a == v) {
                    adjacent.swap_remove(pos);
                } else {
                    adjacent.push(v);
                }
            }
        }
        if adjacent.len() != 2 {
            return false;
        }

        let Some(tetra) = self.mesh.tetrahedra.get(index) else {
            return false;
        };
        let mut grown = adjacent[0];
        if tetra.contains_vertex(grown) {
            grown = adjacent[1];
        }

        let new_tetra = Tetrahedron::new(side[0], side[1], side[2], grown);
        let [q0, q1, q2, q3] = new_tetra
            .vertices
            .map(|v| self.mesh.vertices[v as usize].position);
        if Tetrahedron::signed_volume(&q0, &q1, &q2, &q3) < 0.0 {
            return false;
        }

        self.undos.push(EditOp::Added(new_tetra));
        self.mesh.tetrahedra.push(new_tetra);
        true
    }
}
