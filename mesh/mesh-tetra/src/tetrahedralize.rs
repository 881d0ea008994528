//! The tetrahedralization pipeline.

use std::collections::HashMap;
use std::fmt;

use mesh_spatial::SpatialHash;
use mesh_types::{
    IndexedMesh, MeshBounds, MeshTopology, ProgressContext, TetMesh, Tetrahedron, Vertex,
    VertexLink,
};
use tracing::info;

use crate::delaunay::DelaunayMesh;
use crate::error::{TetraError, TetraResult};
use crate::links::compute_vertex_links;
use crate::params::TetraParams;
use crate::refine::swap_pass;
use crate::removal::remove_outer_tetrahedra;

/// A volume mesh produced by [`tetrahedralize`], with one barycentric link
/// per input surface vertex.
#[derive(Debug, Clone, Default)]
pub struct Tetrahedralization {
    /// The generated tetrahedral mesh.
    pub mesh: TetMesh,
    /// Per-surface-vertex links into `mesh`, in input vertex order.
    pub links: Vec<VertexLink>,
}

impl fmt::Display for Tetrahedralization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vertices, {} tetrahedra, volume {:.6}",
            self.mesh.vertex_count(),
            self.mesh.tet_count(),
            self.mesh.total_volume()
        )
    }
}

/// Fill a closed surface mesh with tetrahedra.
///
/// Runs the full pipeline: insertion point synthesis, incremental Delaunay
/// construction, two edge-swap refinement passes, exterior/sliver removal,
/// and compaction. Progress moves through fixed percentages at each phase
/// boundary; cancellation through `progress` discards all partial work and
/// returns [`TetraError::Cancelled`].
///
/// ```
/// use mesh_tetra::{tetrahedralize, TetraParams};
/// use mesh_types::{unit_cube, ProgressContext};
///
/// let cube = unit_cube();
/// let progress = ProgressContext::new();
/// let result = tetrahedralize(&cube, &TetraParams::with_subdivision(4), &progress)?;
///
/// assert!(!result.mesh.is_empty());
/// assert_eq!(result.links.len(), cube.vertices.len());
/// # Ok::<(), mesh_tetra::TetraError>(())
/// ```
///
/// # Errors
///
/// Returns an error when the subdivision is zero, a face references a
/// missing vertex, or the run is cancelled.
pub fn tetrahedralize(
    surface: &IndexedMesh,
    params: &TetraParams,
    progress: &ProgressContext,
) -> TetraResult<Tetrahedralization> {
    if params.subdivision == 0 {
        return Err(TetraError::InvalidSubdivision(0));
    }
    for (face_index, face) in surface.faces.iter().enumerate() {
        for &v in face {
            if v as usize >= surface.vertices.len() {
                return Err(TetraError::FaceIndexOutOfRange {
                    face: face_index,
                    vertex: v,
                    vertex_count: surface.vertices.len(),
                });
            }
        }
    }

    let bounds = surface.bounds();
    let diagonal = bounds.diagonal();
    if surface.is_empty() || diagonal <= 0.0 {
        return Ok(Tetrahedralization::default());
    }

    info!(
        vertices = surface.vertex_count(),
        triangles = surface.face_count(),
        subdivision = params.subdivision,
        "tetrahedralizing surface"
    );
    progress.set_percent(0);

    let mut tri_hash = SpatialHash::try_new(0.1 * diagonal)?;
    for (index, triangle) in surface.triangles().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        tri_hash.add_bounds(&triangle.bounds(), index as u32);
    }

    let points = crate::points::generate_points(surface, params, progress)?;
    progress.set_percent(20);

    let mut mesh = DelaunayMesh::new(points, &bounds);
    for vertex in 0..mesh.first_far_vertex {
        if progress.is_cancelled() {
            return Err(TetraError::Cancelled);
        }
        mesh.insert_vertex(vertex);
    }
    progress.set_percent(60);

    let threshold = 0.05 * diagonal / f64::from(params.subdivision);
    swap_pass(&mut mesh, surface, &mut tri_hash, threshold, progress)?;
    progress.set_percent(70);
    swap_pass(&mut mesh, surface, &mut tri_hash, threshold, progress)?;
    progress.set_percent(80);

    remove_outer_tetrahedra(&mut mesh, surface, &mut tri_hash, progress)?;
    progress.set_percent(90);

    let tet_mesh = compact(&mesh);
    let links = compute_vertex_links(&tet_mesh, surface, progress)?;
    progress.set_percent(100);

    info!(
        vertices = tet_mesh.vertex_count(),
        tetrahedra = tet_mesh.tet_count(),
        "tetrahedralization complete"
    );
    Ok(Tetrahedralization {
        mesh: tet_mesh,
        links,
    })
}

/// Renumber the vertices referenced by live elements, in first-reference
/// order, and store each element in canonical vertex order.
fn compact(mesh: &DelaunayMesh) -> TetMesh {
    let mut out = TetMesh::new();
    let mut old_to_new: HashMap<u32, u32> = HashMap::new();

    for index in mesh.live() {
        let mut remapped = [0_u32; 4];
        for (slot, &old) in remapped.iter_mut().zip(&mesh.tets[index].vertices) {
            #[allow(clippy::cast_possible_truncation)]
            let new = *old_to_new.entry(old).or_insert_with(|| {
                out.vertices.push(Vertex::new(mesh.points[old as usize]));
                (out.vertices.len() - 1) as u32
            });
            *slot = new;
        }
        out.tetrahedra.push(
            Tetrahedron::new(remapped[0], remapped[1], remapped[2], remapped[3]).canonical(),
        );
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_types::{icosphere, unit_cube};

    #[test]
    fn test_cube_produces_positive_tetrahedra() {
        let cube = unit_cube();
        let progress = ProgressContext::new();
        let result =
            tetrahedralize(&cube, &TetraParams::with_subdivision(4), &progress).unwrap();

        assert!(!result.mesh.is_empty());
        for index in 0..result.mesh.tet_count() {
            assert!(result.mesh.tet_volume(index).unwrap() >= 0.0);
        }
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_cube_volume_approximated() {
        let cube = unit_cube();
        let progress = ProgressContext::new();
        let result =
            tetrahedralize(&cube, &TetraParams::with_subdivision(4), &progress).unwrap();

        // The element set fills the cube interior; boundary conformity is
        // approximate, so allow a generous band around the true volume.
        let volume = result.mesh.total_volume();
        assert!(volume > 0.5 && volume < 1.5, "volume {volume}");
    }

    #[test]
    fn test_sphere_links_cover_all_vertices() {
        let sphere = icosphere(1);
        let progress = ProgressContext::new();
        let result =
            tetrahedralize(&sphere, &TetraParams::with_subdivision(4), &progress).unwrap();

        assert_eq!(result.links.len(), sphere.vertices.len());
        for link in &result.links {
            assert!((link.tetrahedron as usize) < result.mesh.tet_count());
            let sum: f64 = link.barycentric.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let cube = unit_cube();
        let progress = ProgressContext::new();
        assert!(matches!(
            tetrahedralize(&cube, &TetraParams::with_subdivision(0), &progress),
            Err(TetraError::InvalidSubdivision(0))
        ));

        let mut bad = unit_cube();
        bad.faces.push([0, 1, 99]);
        assert!(matches!(
            tetrahedralize(&bad, &TetraParams::default(), &progress),
            Err(TetraError::FaceIndexOutOfRange { vertex: 99, .. })
        ));
    }

    #[test]
    fn test_empty_surface_yields_empty_mesh() {
        let progress = ProgressContext::new();
        let result =
            tetrahedralize(&IndexedMesh::new(), &TetraParams::default(), &progress).unwrap();
        assert!(result.mesh.is_empty());
        assert!(result.links.is_empty());
    }

    #[test]
    fn test_cancellation_discards_output() {
        let cube = unit_cube();
        let progress = ProgressContext::new();
        progress.cancel();
        assert!(matches!(
            tetrahedralize(&cube, &TetraParams::default(), &progress),
            Err(TetraError::Cancelled)
        ));
    }
}
