//! Core edge-collapse simplification.

// Mesh indices and counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::collections::HashMap;

use mesh_types::{IndexedMesh, Point3, Vertex};
use tracing::{debug, info};

use crate::error::{DecimateError, DecimateResult};
use crate::heap::IndexedMinHeap;
use crate::params::DecimateParams;
use crate::quadric::Quadric;
use crate::result::DecimationResult;

#[derive(Debug, Clone)]
struct VertexData {
    position: Point3<f64>,
    quadric: Quadric,
    border: bool,
    deleted: bool,
}

/// An undirected collapse candidate. Endpoints are stored `(small, large)`.
#[derive(Debug, Clone, Copy)]
struct Edge {
    v0: u32,
    v1: u32,
    /// Interpolation ratio of the cheapest sampled merge position.
    ratio: f64,
    deleted: bool,
}

/// Stepwise quadric edge-collapse simplifier.
///
/// Holds the working state of a decimation run: vertex quadrics, tombstoned
/// triangles, and the indexed min-heap of collapse candidates. Each call to
/// [`Simplifier::simplification_step`] performs the single cheapest legal
/// collapse; [`Simplifier::to_mesh`] compacts the survivors into a fresh
/// [`IndexedMesh`].
///
/// # Example
///
/// ```
/// use mesh_types::icosphere;
/// use mesh_decimate::{DecimateParams, Simplifier};
///
/// let mut simplifier = Simplifier::new(&icosphere(1), &DecimateParams::default())?;
/// while simplifier.triangle_count() > 40 {
///     if !simplifier.simplification_step() {
///         break;
///     }
/// }
/// let simplified = simplifier.to_mesh();
/// assert!(simplified.faces.len() <= 40);
/// # Ok::<(), mesh_decimate::DecimateError>(())
/// ```
#[derive(Debug)]
pub struct Simplifier {
    vertices: Vec<VertexData>,
    triangles: Vec<Option<[u32; 3]>>,
    live_triangles: usize,
    edges: Vec<Edge>,
    /// Edge ids incident to each vertex (may hold tombstoned ids).
    vertex_edges: Vec<Vec<u32>>,
    /// Triangle ids incident to each vertex (may hold stale ids).
    vertex_tris: Vec<Vec<u32>>,
    heap: IndexedMinHeap,
    max_edge_length: Option<f64>,
    cost_samples: u32,
    collapses_performed: usize,
    collapses_rejected: usize,
}

impl Simplifier {
    /// Build the working state for a mesh: per-vertex quadrics, deduplicated
    /// edges with border marks, and the initial collapse queue.
    ///
    /// # Errors
    ///
    /// Returns [`DecimateError::FaceIndexOutOfRange`] if a face references a
    /// vertex index outside the vertex array.
    pub fn new(mesh: &IndexedMesh, params: &DecimateParams) -> DecimateResult<Self> {
        let vertex_count = mesh.vertices.len();
        for (face_idx, face) in mesh.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(DecimateError::FaceIndexOutOfRange {
                    face: face_idx,
                    vertex: bad,
                    vertex_count,
                });
            }
        }

        let mut vertices: Vec<VertexData> = mesh
            .vertices
            .iter()
            .map(|v| VertexData {
                position: v.position,
                quadric: Quadric::default(),
                border: false,
                deleted: false,
            })
            .collect();

        let mut vertex_tris = vec![Vec::new(); vertex_count];
        for (tid, face) in mesh.faces.iter().enumerate() {
            if let Some(q) = Quadric::from_triangle(
                &mesh.vertices[face[0] as usize].position,
                &mesh.vertices[face[1] as usize].position,
                &mesh.vertices[face[2] as usize].position,
            ) {
                for &v in face {
                    vertices[v as usize].quadric.add(&q);
                }
            }
            for &v in face {
                vertex_tris[v as usize].push(tid as u32);
            }
        }

        // Deduplicate undirected edges and count occurrences; an edge used by
        // exactly one triangle lies on the mesh border.
        let mut edge_map: HashMap<(u32, u32), (u32, usize)> = HashMap::new();
        let mut edges: Vec<Edge> = Vec::new();
        for face in &mesh.faces {
            for i in 0..3 {
                let key = ordered(face[i], face[(i + 1) % 3]);
                match edge_map.get_mut(&key) {
                    Some((_, count)) => *count += 1,
                    None => {
                        let id = edges.len() as u32;
                        edges.push(Edge {
                            v0: key.0,
                            v1: key.1,
                            ratio: 0.0,
                            deleted: false,
                        });
                        edge_map.insert(key, (id, 1));
                    }
                }
            }
        }
        for (&(v0, v1), &(_, count)) in &edge_map {
            if count == 1 {
                vertices[v0 as usize].border = true;
                vertices[v1 as usize].border = true;
            }
        }

        let mut vertex_edges = vec![Vec::new(); vertex_count];
        for (id, edge) in edges.iter().enumerate() {
            vertex_edges[edge.v0 as usize].push(id as u32);
            vertex_edges[edge.v1 as usize].push(id as u32);
        }

        let mut simplifier = Self {
            vertices,
            triangles: mesh.faces.iter().copied().map(Some).collect(),
            live_triangles: mesh.faces.len(),
            edges,
            vertex_edges,
            vertex_tris,
            heap: IndexedMinHeap::new(),
            max_edge_length: params.max_edge_length,
            cost_samples: params.cost_samples,
            collapses_performed: 0,
            collapses_rejected: 0,
        };

        for id in 0..simplifier.edges.len() as u32 {
            simplifier.rescore(id);
        }

        Ok(simplifier)
    }

    /// Number of surviving triangles.
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.live_triangles
    }

    /// Number of collapses performed so far.
    #[must_use]
    pub const fn collapses_performed(&self) -> usize {
        self.collapses_performed
    }

    /// Number of collapse candidates rejected as illegal so far.
    #[must_use]
    pub const fn collapses_rejected(&self) -> usize {
        self.collapses_rejected
    }

    /// Perform the single cheapest legal edge collapse.
    ///
    /// Illegal candidates popped along the way are discarded (they are
    /// re-queued if a later collapse changes their neighborhood). Returns
    /// `false` once no legal collapse remains; further calls keep returning
    /// `false`.
    pub fn simplification_step(&mut self) -> bool {
        while let Some((edge_id, _)) = self.heap.pop() {
            let edge = self.edges[edge_id as usize];
            if edge.deleted {
                continue;
            }
            debug_assert!(!self.vertices[edge.v0 as usize].deleted);
            debug_assert!(!self.vertices[edge.v1 as usize].deleted);

            if !self.is_legal(&edge) {
                self.collapses_rejected += 1;
                continue;
            }

            self.collapse(edge_id);
            self.collapses_performed += 1;
            return true;
        }
        false
    }

    /// Compact the surviving vertices and triangles into a fresh mesh.
    ///
    /// Only vertices referenced by a surviving triangle are emitted.
    #[must_use]
    pub fn to_mesh(&self) -> IndexedMesh {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut mesh = IndexedMesh::new();

        for tri in self.triangles.iter().flatten() {
            let mut face = [0_u32; 3];
            for (slot, &v) in face.iter_mut().zip(tri) {
                let mapped = &mut remap[v as usize];
                if *mapped == u32::MAX {
                    *mapped = mesh.vertices.len() as u32;
                    mesh.vertices
                        .push(Vertex::new(self.vertices[v as usize].position));
                }
                *slot = *mapped;
            }
            mesh.faces.push(face);
        }

        debug!(
            vertices = mesh.vertices.len(),
            faces = mesh.faces.len(),
            "compacted simplified mesh"
        );
        mesh
    }

    fn rescore(&mut self, edge_id: u32) {
        let edge = self.edges[edge_id as usize];
        let v0 = &self.vertices[edge.v0 as usize];
        let v1 = &self.vertices[edge.v1 as usize];

        let mut quadric = v0.quadric;
        quadric.add(&v1.quadric);
        let (cost, ratio) =
            quadric.sampled_minimum(&v0.position, &v1.position, self.cost_samples);

        self.edges[edge_id as usize].ratio = ratio;
        self.heap.update(edge_id, cost);
    }

    /// Live neighbor vertices of `v`, via its incident edges.
    fn neighbors(&self, v: u32) -> Vec<u32> {
        let mut out = Vec::new();
        for &eid in &self.vertex_edges[v as usize] {
            let edge = &self.edges[eid as usize];
            if edge.deleted {
                continue;
            }
            let other = if edge.v0 == v { edge.v1 } else { edge.v0 };
            if !self.vertices[other as usize].deleted {
                out.push(other);
            }
        }
        out
    }

    /// Whether a live triangle spans exactly the three given vertices.
    fn triangle_exists(&self, a: u32, b: u32, c: u32) -> bool {
        self.vertex_tris[a as usize].iter().any(|&tid| {
            self.triangles[tid as usize]
                .is_some_and(|tri| tri.contains(&a) && tri.contains(&b) && tri.contains(&c))
        })
    }

    fn is_legal(&self, edge: &Edge) -> bool {
        let (v0, v1) = (edge.v0, edge.v1);

        // A collapse between a border and an interior vertex would shrink
        // the border.
        if self.vertices[v0 as usize].border != self.vertices[v1 as usize].border {
            return false;
        }

        let n0 = self.neighbors(v0);
        let n1 = self.neighbors(v1);

        // A shared neighbor that does not close a triangle with both
        // endpoints would be pinched into a bowtie.
        for &n in &n0 {
            if n != v1 && n1.contains(&n) && !self.triangle_exists(v0, v1, n) {
                return false;
            }
        }

        // A triangle of v1 that, after substitution, duplicates an existing
        // triangle of v0 would produce a doubled face.
        for &tid in &self.vertex_tris[v1 as usize] {
            let Some(tri) = self.triangles[tid as usize] else {
                continue;
            };
            if !tri.contains(&v1) || tri.contains(&v0) {
                continue;
            }
            let others: Vec<u32> = tri.iter().copied().filter(|&v| v != v1).collect();
            if self.triangle_exists(v0, others[0], others[1]) {
                return false;
            }
        }

        // Optional post-collapse edge length bound.
        if let Some(max_len) = self.max_edge_length {
            let merged = self.merge_position(edge);
            let max_sq = max_len * max_len;
            for &n in n0.iter().chain(&n1) {
                if n == v0 || n == v1 {
                    continue;
                }
                let d = self.vertices[n as usize].position - merged;
                if d.norm_squared() > max_sq {
                    return false;
                }
            }
        }

        true
    }

    fn merge_position(&self, edge: &Edge) -> Point3<f64> {
        let p0 = self.vertices[edge.v0 as usize].position;
        let p1 = self.vertices[edge.v1 as usize].position;
        Point3::from(p0.coords.lerp(&p1.coords, edge.ratio))
    }

    /// Merge `edge.v1` into `edge.v0`.
    fn collapse(&mut self, edge_id: u32) {
        let edge = self.edges[edge_id as usize];
        let (v0, v1) = (edge.v0, edge.v1);

        self.vertices[v0 as usize].position = self.merge_position(&edge);
        let q1 = self.vertices[v1 as usize].quadric;
        self.vertices[v0 as usize].quadric.add(&q1);
        self.vertices[v1 as usize].deleted = true;
        self.edges[edge_id as usize].deleted = true;

        // Triangles on the edge degenerate; the rest of v1's star is rewired
        // to v0.
        let v1_tris = std::mem::take(&mut self.vertex_tris[v1 as usize]);
        for tid in v1_tris {
            let Some(tri) = &mut self.triangles[tid as usize] else {
                continue;
            };
            if !tri.contains(&v1) {
                continue;
            }
            if tri.contains(&v0) {
                self.triangles[tid as usize] = None;
                self.live_triangles -= 1;
            } else {
                for v in tri.iter_mut() {
                    if *v == v1 {
                        *v = v0;
                    }
                }
                self.vertex_tris[v0 as usize].push(tid);
            }
        }

        // Rewire v1's edges to v0, dropping the ones that fold onto an edge
        // v0 already has.
        let v1_edges = std::mem::take(&mut self.vertex_edges[v1 as usize]);
        for eid in v1_edges {
            if eid == edge_id || self.edges[eid as usize].deleted {
                continue;
            }
            let other = {
                let e = &self.edges[eid as usize];
                if e.v0 == v1 { e.v1 } else { e.v0 }
            };
            if other == v0 || self.edge_between(v0, other).is_some() {
                self.edges[eid as usize].deleted = true;
                self.heap.remove(eid);
                continue;
            }
            let (a, b) = ordered(v0, other);
            self.edges[eid as usize].v0 = a;
            self.edges[eid as usize].v1 = b;
            self.vertex_edges[v0 as usize].push(eid);
        }

        // Rescore everything now incident on the survivor.
        let incident: Vec<u32> = self.vertex_edges[v0 as usize]
            .iter()
            .copied()
            .filter(|&eid| !self.edges[eid as usize].deleted)
            .collect();
        for eid in incident {
            self.rescore(eid);
        }
    }

    fn edge_between(&self, a: u32, b: u32) -> Option<u32> {
        let (lo, hi) = ordered(a, b);
        self.vertex_edges[a as usize].iter().copied().find(|&eid| {
            let e = &self.edges[eid as usize];
            !e.deleted && e.v0 == lo && e.v1 == hi
        })
    }
}

const fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Simplify a mesh down to a target triangle count.
///
/// The target is `params.target_triangles`, or
/// `ceil(original * params.target_ratio)` when unset. Stops early when no
/// further legal collapse exists.
///
/// # Errors
///
/// Returns [`DecimateError::FaceIndexOutOfRange`] for a mesh whose faces
/// reference missing vertices.
///
/// # Example
///
/// ```
/// use mesh_types::icosphere;
/// use mesh_decimate::{simplify_mesh, DecimateParams};
///
/// let result = simplify_mesh(&icosphere(2), &DecimateParams::with_target_ratio(0.5))?;
/// assert!(result.final_triangles <= 160);
/// # Ok::<(), mesh_decimate::DecimateError>(())
/// ```
pub fn simplify_mesh(
    mesh: &IndexedMesh,
    params: &DecimateParams,
) -> DecimateResult<DecimationResult> {
    let original_triangles = mesh.faces.len();
    if original_triangles == 0 {
        return Ok(DecimationResult {
            mesh: mesh.clone(),
            original_triangles: 0,
            final_triangles: 0,
            collapses_performed: 0,
            collapses_rejected: 0,
        });
    }

    let target = params
        .target_triangles
        .unwrap_or_else(|| ((original_triangles as f64) * params.target_ratio).ceil() as usize);

    info!(
        original = original_triangles,
        target = target,
        "starting mesh simplification"
    );

    let mut simplifier = Simplifier::new(mesh, params)?;
    while simplifier.triangle_count() > target {
        if !simplifier.simplification_step() {
            break;
        }
    }

    let result = DecimationResult {
        mesh: simplifier.to_mesh(),
        original_triangles,
        final_triangles: simplifier.triangle_count(),
        collapses_performed: simplifier.collapses_performed(),
        collapses_rejected: simplifier.collapses_rejected(),
    };

    info!(
        final_triangles = result.final_triangles,
        collapses = result.collapses_performed,
        "simplification complete"
    );
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_types::{icosphere, unit_cube, MeshTopology};

    #[test]
    fn test_empty_mesh() {
        let result = simplify_mesh(&IndexedMesh::new(), &DecimateParams::default()).unwrap();
        assert_eq!(result.original_triangles, 0);
        assert_eq!(result.final_triangles, 0);
    }

    #[test]
    fn test_bad_face_index_rejected() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 1, 99]);
        assert!(Simplifier::new(&mesh, &DecimateParams::default()).is_err());
    }

    #[test]
    fn test_step_strictly_decreases_or_terminates() {
        let sphere = icosphere(1);
        let mut simplifier = Simplifier::new(&sphere, &DecimateParams::default()).unwrap();

        loop {
            let before = simplifier.triangle_count();
            if simplifier.simplification_step() {
                assert!(simplifier.triangle_count() < before);
            } else {
                assert_eq!(simplifier.triangle_count(), before);
                break;
            }
        }
        // Terminal state is idempotent.
        assert!(!simplifier.simplification_step());
        assert!(!simplifier.simplification_step());
    }

    #[test]
    fn test_closed_sphere_reduces_to_tetrahedron() {
        // A closed surface has no border, so collapses stay legal down to
        // the 4-triangle minimum.
        let sphere = icosphere(2);
        let mut simplifier = Simplifier::new(&sphere, &DecimateParams::default()).unwrap();
        while simplifier.simplification_step() {}
        assert_eq!(simplifier.triangle_count(), 4);

        let mesh = simplifier.to_mesh();
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_target_ratio_honored() {
        let sphere = icosphere(2);
        let result = simplify_mesh(&sphere, &DecimateParams::with_target_ratio(0.5)).unwrap();
        assert!(result.final_triangles <= 160);
        assert!(result.was_simplified());
    }

    #[test]
    fn test_max_edge_length_blocks_collapses() {
        let sphere = icosphere(1);
        // A bound far below any edge length forbids every collapse.
        let params = DecimateParams::default().with_max_edge_length(1e-6);
        let mut simplifier = Simplifier::new(&sphere, &params).unwrap();
        assert!(!simplifier.simplification_step());
        assert_eq!(simplifier.triangle_count(), sphere.faces.len());
    }

    #[test]
    fn test_open_mesh_preserves_border_vertices() {
        // A square pyramid without its base: the rim is the border, the apex
        // is interior. Apex-rim collapses mix a border and an interior
        // vertex and are illegal; rim-rim collapses along the border shrink
        // the shell until duplicate-face rejection stops them at 3 faces.
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0)); // apex
        mesh.vertices.push(Vertex::from_coords(-1.0, -1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, -1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(-1.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([0, 2, 3]);
        mesh.faces.push([0, 3, 4]);
        mesh.faces.push([0, 4, 1]);

        let mut simplifier = Simplifier::new(&mesh, &DecimateParams::default()).unwrap();
        while simplifier.simplification_step() {}
        assert_eq!(simplifier.triangle_count(), 3);
    }
}
