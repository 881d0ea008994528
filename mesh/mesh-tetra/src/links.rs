//! Barycentric links from surface vertices to the volume mesh.

use mesh_spatial::SpatialHash;
use mesh_types::query::barycentric_coordinates;
use mesh_types::{Aabb, IndexedMesh, Point3, ProgressContext, TetMesh, VertexLink};

use crate::error::{TetraError, TetraResult};

/// For every vertex of the original surface, find the tetrahedron containing
/// it and the barycentric coordinates within, so the surface can be skinned
/// onto the deforming volume mesh later.
///
/// A vertex inside no element (snapped geometry, jitter) links to the
/// element whose barycentric weights violate containment the least.
pub(crate) fn compute_vertex_links(
    mesh: &TetMesh,
    surface: &IndexedMesh,
    progress: &ProgressContext,
) -> TetraResult<Vec<VertexLink>> {
    if surface.vertices.is_empty() || mesh.is_empty() {
        return Ok(Vec::new());
    }

    let bounds = mesh.bounds();
    let mut hash = SpatialHash::try_new(0.1 * bounds.diagonal().max(f64::MIN_POSITIVE))?;
    for index in 0..mesh.tet_count() {
        if let Some(points) = mesh.tet_points(index) {
            #[allow(clippy::cast_possible_truncation)]
            hash.add_bounds(&Aabb::from_points(points.iter()), index as u32);
        }
    }

    let mut links = Vec::with_capacity(surface.vertices.len());
    for vertex in &surface.vertices {
        if progress.is_cancelled() {
            return Err(TetraError::Cancelled);
        }

        let candidates = hash.query_point(&vertex.position, None);
        let link = if candidates.is_empty() {
            // Not hashed near anything: fall back to a full scan.
            #[allow(clippy::cast_possible_truncation)]
            link_vertex(mesh, &vertex.position, (0..mesh.tet_count() as u32).collect())
        } else {
            link_vertex(mesh, &vertex.position, candidates)
        };
        links.push(link.unwrap_or_else(|| VertexLink::new(0, [1.0, 0.0, 0.0, 0.0])));
    }
    Ok(links)
}

/// Link a position to the first candidate element containing it, falling
/// back to the candidate it misses by the least.
fn link_vertex(mesh: &TetMesh, position: &Point3<f64>, candidates: Vec<u32>) -> Option<VertexLink> {
    let mut best: Option<(f64, VertexLink)> = None;
    for tetra in candidates {
        let Some(corners) = mesh.tet_points(tetra as usize) else {
            continue;
        };
        let Some(bary) = barycentric_coordinates(position, &corners) else {
            continue;
        };
        if bary.iter().all(|&w| w >= 0.0) {
            return Some(VertexLink::new(tetra, bary));
        }
        // Containment violation: the most negative weight.
        let violation = bary.iter().fold(0.0_f64, |acc, &w| acc.max(-w));
        if best.as_ref().is_none_or(|(v, _)| violation < *v) {
            best = Some((violation, VertexLink::new(tetra, bary)));
        }
    }
    best.map(|(_, link)| link)
}
